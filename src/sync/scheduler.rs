//! Periodic backups
//!
//! [`BackupScheduler`] wakes every check interval and runs a backup through
//! the shared [`SyncManager`] when one is due. Failures are logged and the
//! loop keeps going. Cancelling the token stops the loop at its next await.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{BackupConfig, MAX_CHECK_INTERVAL_SECONDS};
use crate::sync::manager::SyncManager;

/// Timer-driven backup loop.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
/// use chatvault::chats::MemoryChats;
/// use chatvault::config::BackupConfig;
/// use chatvault::store::MemoryStore;
/// use chatvault::sync::{BackupScheduler, SyncManager};
///
/// # #[tokio::main]
/// # async fn main() {
/// let manager = Arc::new(SyncManager::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryChats::default()),
///     BackupConfig::default(),
/// ));
/// let cancel = CancellationToken::new();
/// let handle = BackupScheduler::from_config(manager, &BackupConfig::default())
///     .spawn(cancel.clone());
/// cancel.cancel();
/// handle.await.unwrap();
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackupScheduler {
    manager: Arc<SyncManager>,
    check_interval: Duration,
    backup_on_start: bool,
}

impl BackupScheduler {
    /// Creates a scheduler checking every `check_interval`.
    pub fn new(manager: Arc<SyncManager>, check_interval: Duration, backup_on_start: bool) -> Self {
        Self {
            manager,
            check_interval,
            backup_on_start,
        }
    }

    /// Creates a scheduler from the backup policy.
    pub fn from_config(manager: Arc<SyncManager>, config: &BackupConfig) -> Self {
        Self::new(manager, config.check_interval(), config.backup_on_start)
    }

    /// Runs the loop on a new task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Runs the loop until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            "Backup scheduler started (check every {:?}, backup every {}h)",
            self.check_interval,
            self.manager.settings().frequency_hours
        );

        if self.backup_on_start {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Backup scheduler stopped");
                    return;
                }
                _ = self.backup() => {}
            }
        }

        let period = self.period();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = self.tick() => {}
                    }
                }
            }
        }

        tracing::info!("Backup scheduler stopped");
    }

    /// Check interval kept within what the timer can represent.
    fn period(&self) -> Duration {
        self.check_interval.clamp(
            Duration::from_millis(1),
            Duration::from_secs(MAX_CHECK_INTERVAL_SECONDS),
        )
    }

    /// Runs a backup if one is due. Returns whether it ran.
    pub async fn tick(&self) -> bool {
        if !self.manager.is_backup_due().await {
            tracing::debug!("Backup not due yet");
            return false;
        }
        self.backup().await;
        true
    }

    async fn backup(&self) {
        match self.manager.backup_now().await {
            Ok(outcome) => tracing::info!(
                "Scheduled backup written: {}",
                outcome.snapshot.name
            ),
            Err(e) => tracing::warn!("Scheduled backup failed: {}", e),
        }
    }
}
