//! Local chat data
//!
//! The sync manager never interprets chat records. It asks a [`ChatSource`]
//! for the current chats before a backup, and hands a snapshot's chats back
//! to it on restore.

use serde_json::Value;

use crate::error::Result;

pub mod file;
pub mod memory;

pub use file::JsonFileChats;
pub use memory::MemoryChats;

/// The chat application's local chat store.
#[async_trait::async_trait]
pub trait ChatSource: Send + Sync {
    /// Current chat records, as opaque JSON values.
    async fn get_chats(&self) -> Result<Vec<Value>>;

    /// Replaces the local chats with `chats` in one step.
    async fn restore_chats(&self, chats: Vec<Value>) -> Result<()>;
}
