//! ChatVault - chat history snapshots to cloud storage
//!
//! This library exports a chat application's local chat history to a remote
//! file store, keeps the newest snapshots and restores them on demand.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: OAuth sign-in, credential caching and token persistence
//! - `store`: Remote store trait with Google Drive, HTTP server and in-memory backends
//! - `chats`: Access to the application's local chat data
//! - `sync`: Snapshot format, folder resolution, writer, reader, session and scheduler
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatvault::chats::JsonFileChats;
//! use chatvault::store::MemoryStore;
//! use chatvault::{Config, SyncManager};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let manager = SyncManager::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(JsonFileChats::new(&config.chats.path)),
//!         config.backup.clone(),
//!     );
//!     manager.backup_now().await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod chats;
pub mod cli;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use chats::ChatSource;
pub use config::Config;
pub use error::{ChatVaultError, Result};
pub use store::RemoteStore;
pub use sync::{BackupScheduler, SyncManager};

#[cfg(test)]
pub mod test_utils;
