//! Snapshot sync pipeline
//!
//! - [`resolver`] finds or creates the backup folder.
//! - [`writer`] uploads a snapshot and prunes old ones.
//! - [`reader`] lists snapshots and restores one.
//! - [`manager`] ties them into a session shared by manual triggers and the
//!   [`scheduler`].
//! - [`status`] publishes progress for the user.

pub mod manager;
pub mod reader;
pub mod resolver;
pub mod scheduler;
pub mod snapshot;
pub mod status;
pub mod writer;

pub use manager::{BackupOutcome, SyncManager};
pub use reader::{list_snapshots, restore_latest, restore_named};
pub use resolver::resolve_container;
pub use scheduler::BackupScheduler;
pub use snapshot::{snapshot_name, SnapshotMeta, SnapshotPayload, SCHEMA_VERSION};
pub use status::{StatusReporter, SyncStage, SyncStatus};
pub use writer::{prune_snapshots, write_snapshot, PruneReport};
