//! Sync status reporting
//!
//! The manager publishes its progress on a [`tokio::sync::watch`] channel.
//! Only the latest status matters, so slow observers simply skip updates.

use serde::Serialize;
use tokio::sync::watch;

/// Phase of the sync pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// Nothing in progress.
    Idle,
    /// Finding or creating the backup folder.
    Resolving,
    /// Reading and uploading a snapshot.
    BackingUp,
    /// Deleting snapshots beyond the retention count.
    Pruning,
    /// Listing snapshots.
    Listing,
    /// Downloading a snapshot and handing it to the chat source.
    Restoring,
}

impl SyncStage {
    /// Short label for terminal output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::BackingUp => "backing_up",
            Self::Pruning => "pruning",
            Self::Listing => "listing",
            Self::Restoring => "restoring",
        }
    }
}

/// One status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Current phase.
    pub stage: SyncStage,
    /// Human-readable message.
    pub message: String,
    /// Whether the message reports a failure.
    pub is_error: bool,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            stage: SyncStage::Idle,
            message: String::new(),
            is_error: false,
        }
    }
}

/// Publishing side of the status channel.
#[derive(Debug)]
pub struct StatusReporter {
    tx: watch::Sender<SyncStatus>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    /// Creates a reporter starting at [`SyncStage::Idle`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SyncStatus::default());
        Self { tx }
    }

    /// New receiver seeing the current status and every later one.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tx.subscribe()
    }

    /// Latest published status.
    pub fn current(&self) -> SyncStatus {
        self.tx.borrow().clone()
    }

    /// Publishes a progress message.
    pub fn progress(&self, stage: SyncStage, message: impl Into<String>) {
        self.publish(stage, message.into(), false);
    }

    /// Publishes a failure message.
    pub fn error(&self, stage: SyncStage, message: impl Into<String>) {
        self.publish(stage, message.into(), true);
    }

    /// Publishes a final message and returns to idle.
    pub fn done(&self, message: impl Into<String>) {
        self.publish(SyncStage::Idle, message.into(), false);
    }

    fn publish(&self, stage: SyncStage, message: String, is_error: bool) {
        // Keeps the value even while nobody is subscribed.
        self.tx.send_replace(SyncStatus {
            stage,
            message,
            is_error,
        });
    }
}
