//! Sync session
//!
//! [`SyncManager`] owns the state shared between manual triggers and the
//! scheduler: the resolved backup folder, the time of the last successful
//! backup and the status channel. The credential lives inside the store
//! backend. All methods take `&self`, so one `Arc<SyncManager>` serves every
//! caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};

use crate::chats::ChatSource;
use crate::clock::{Clock, SystemClock};
use crate::config::BackupConfig;
use crate::error::{ChatVaultError, Result, WriteFailure};
use crate::store::{ContainerRef, RemoteStore};
use crate::sync::reader;
use crate::sync::resolver::resolve_container;
use crate::sync::snapshot::SnapshotMeta;
use crate::sync::status::{StatusReporter, SyncStage, SyncStatus};
use crate::sync::writer::{self, PruneReport};

/// Result of one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupOutcome {
    /// The snapshot just written.
    pub snapshot: SnapshotMeta,
    /// What the retention pass did afterwards.
    pub prune: PruneReport,
}

/// Snapshot sync session.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use chatvault::chats::MemoryChats;
/// use chatvault::config::BackupConfig;
/// use chatvault::store::MemoryStore;
/// use chatvault::sync::SyncManager;
///
/// # #[tokio::main]
/// # async fn main() -> chatvault::error::Result<()> {
/// let manager = SyncManager::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryChats::new(vec![serde_json::json!({"id": "c1"})])),
///     BackupConfig::default(),
/// );
/// let outcome = manager.backup_now().await?;
/// assert!(outcome.snapshot.name.starts_with("TypingMind_Backup_"));
/// assert!(manager.last_backup_time().await.is_some());
/// # Ok(())
/// # }
/// ```
pub struct SyncManager {
    store: Arc<dyn RemoteStore>,
    chats: Arc<dyn ChatSource>,
    settings: BackupConfig,
    clock: Arc<dyn Clock>,
    container: Mutex<Option<ContainerRef>>,
    last_backup: RwLock<Option<DateTime<Utc>>>,
    status: StatusReporter,
}

impl std::fmt::Debug for SyncManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncManager")
            .field("store", &self.store)
            .field("folder_name", &self.settings.folder_name)
            .field("keep_backups", &self.settings.keep_backups)
            .finish_non_exhaustive()
    }
}

impl SyncManager {
    /// Creates a session using the system clock.
    pub fn new(
        store: Arc<dyn RemoteStore>,
        chats: Arc<dyn ChatSource>,
        settings: BackupConfig,
    ) -> Self {
        Self {
            store,
            chats,
            settings,
            clock: Arc::new(SystemClock),
            container: Mutex::new(None),
            last_backup: RwLock::new(None),
            status: StatusReporter::new(),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Backup policy in effect.
    pub fn settings(&self) -> &BackupConfig {
        &self.settings
    }

    /// Subscribes to status updates.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Time of the last successful backup in this session.
    pub async fn last_backup_time(&self) -> Option<DateTime<Utc>> {
        *self.last_backup.read().await
    }

    /// `true` when no backup ran yet or the last one is at least
    /// `frequency_hours` old.
    pub async fn is_backup_due(&self) -> bool {
        match self.last_backup_time().await {
            None => true,
            Some(last) => self.clock.now() - last >= self.settings.frequency(),
        }
    }

    /// The backup folder, resolved once per session.
    ///
    /// # Errors
    ///
    /// Returns the store error when the folder cannot be found or created.
    pub async fn container(&self) -> Result<ContainerRef> {
        // Held across resolution so concurrent first calls create one folder.
        let mut cached = self.container.lock().await;
        if let Some(container) = cached.as_ref() {
            return Ok(container.clone());
        }

        self.status.progress(
            SyncStage::Resolving,
            format!("Looking for folder \"{}\"", self.settings.folder_name),
        );
        let container = resolve_container(self.store.as_ref(), &self.settings.folder_name)
            .await
            .map_err(|e| {
                self.status.error(SyncStage::Resolving, e.to_string());
                e
            })?;
        *cached = Some(container.clone());
        Ok(container)
    }

    /// Writes a snapshot of the current chats, then prunes old ones.
    ///
    /// `last_backup_time` moves only when the upload succeeded. Pruning
    /// failures never fail the backup.
    ///
    /// # Errors
    ///
    /// Returns a write error (or the resolver's store error); the session
    /// state is unchanged in that case.
    pub async fn backup_now(&self) -> Result<BackupOutcome> {
        let outcome = self.run_backup().await;
        match &outcome {
            Ok(outcome) => self.status.done(format!(
                "Backup complete: {} ({} old removed)",
                outcome.snapshot.name,
                outcome.prune.deleted.len()
            )),
            Err(e) => self.status.error(SyncStage::BackingUp, e.to_string()),
        }
        outcome
    }

    async fn run_backup(&self) -> Result<BackupOutcome> {
        let container = self.container().await?;

        self.status.progress(SyncStage::BackingUp, "Creating backup...");
        let chats = self.chats.get_chats().await.map_err(|e| {
            ChatVaultError::write(
                WriteFailure::SerializeFailed,
                format!("could not read local chats: {e}"),
            )
        })?;

        let now = self.clock.now();
        let snapshot = writer::write_snapshot(
            self.store.as_ref(),
            &container.id,
            &self.settings.file_prefix,
            chats,
            now,
        )
        .await?;
        *self.last_backup.write().await = Some(now);

        self.status.progress(SyncStage::Pruning, "Cleaning up old backups...");
        let prune =
            writer::prune_snapshots(self.store.as_ref(), &container.id, self.settings.keep_backups)
                .await;

        Ok(BackupOutcome { snapshot, prune })
    }

    /// Snapshots in the backup folder, newest first.
    ///
    /// # Errors
    ///
    /// Returns the store error when the folder cannot be resolved or listed.
    pub async fn list_snapshots(&self) -> Result<Vec<SnapshotMeta>> {
        let container = self.container().await?;
        self.status.progress(SyncStage::Listing, "Fetching backups...");
        let snapshots = reader::list_snapshots(self.store.as_ref(), &container.id)
            .await
            .map_err(|e| {
                self.status.error(SyncStage::Listing, e.to_string());
                e
            })?;
        self.status.done(format!("{} backup(s) available", snapshots.len()));
        Ok(snapshots)
    }

    /// Restores the newest snapshot.
    ///
    /// # Errors
    ///
    /// Returns a restore error; local chats are untouched in that case.
    pub async fn restore_latest(&self) -> Result<SnapshotMeta> {
        self.restore(None).await
    }

    /// Restores the snapshot with the given id or name.
    ///
    /// # Errors
    ///
    /// Returns a restore error; local chats are untouched in that case.
    pub async fn restore_named(&self, id_or_name: &str) -> Result<SnapshotMeta> {
        self.restore(Some(id_or_name)).await
    }

    async fn restore(&self, id_or_name: Option<&str>) -> Result<SnapshotMeta> {
        let container = self.container().await?;
        self.status.progress(SyncStage::Restoring, "Restoring backup...");

        let store = self.store.as_ref();
        let chats = self.chats.as_ref();
        let restored = match id_or_name {
            Some(wanted) => reader::restore_named(store, &container.id, wanted, chats).await,
            None => reader::restore_latest(store, &container.id, chats).await,
        };

        match &restored {
            Ok(snapshot) => self.status.done(format!("Restored {}", snapshot.name)),
            Err(e) => self.status.error(SyncStage::Restoring, e.to_string()),
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chats::MemoryChats;
    use crate::clock::ManualClock;
    use crate::error::{classify, AuthFailure, RestoreFailure};
    use crate::store::MemoryStore;
    use crate::test_utils::test_session;

    fn session(keep: usize) -> (Arc<SyncManager>, MemoryStore, MemoryChats, ManualClock) {
        let s = test_session(keep);
        (s.manager, s.store, s.chats, s.clock)
    }

    #[tokio::test]
    async fn test_backup_records_time_and_resolves_folder_once() {
        let (manager, store, _, clock) = session(7);
        assert!(manager.is_backup_due().await);

        manager.backup_now().await.unwrap();
        clock.advance(chrono::Duration::minutes(1));
        manager.backup_now().await.unwrap();

        assert_eq!(manager.last_backup_time().await, Some(clock.now()));
        let lookups = store.calls().iter().filter(|c| *c == "list_containers").count();
        assert_eq!(lookups, 1);
        assert_eq!(store.object_count(), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_keeps_last_backup_time() {
        let (manager, store, _, clock) = session(7);
        manager.backup_now().await.unwrap();
        let recorded = manager.last_backup_time().await;

        clock.advance(chrono::Duration::hours(25));
        store.reject_uploads(true);
        let err = manager.backup_now().await.unwrap_err();

        assert!(matches!(
            classify(&err),
            Some(ChatVaultError::Auth {
                reason: AuthFailure::TokenInvalid,
                ..
            })
        ));
        assert_eq!(manager.last_backup_time().await, recorded);
        assert_eq!(store.object_count(), 1);
        assert!(manager.is_backup_due().await);

        store.reject_uploads(false);
        manager.backup_now().await.unwrap();
        assert_eq!(manager.last_backup_time().await, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_backup_due_with_unbounded_frequency() {
        let s = test_session(7);
        let settings = BackupConfig {
            frequency_hours: u64::MAX,
            ..BackupConfig::default()
        };
        let manager =
            SyncManager::new(Arc::new(s.store.clone()), Arc::new(s.chats.clone()), settings)
                .with_clock(Arc::new(s.clock.clone()));

        manager.backup_now().await.unwrap();
        s.clock.advance(chrono::Duration::days(365 * 5));
        assert!(!manager.is_backup_due().await);
        s.clock.advance(chrono::Duration::days(366 * 6));
        assert!(manager.is_backup_due().await);
    }

    #[tokio::test]
    async fn test_backup_due_after_frequency() {
        let (manager, _, _, clock) = session(7);
        manager.backup_now().await.unwrap();
        assert!(!manager.is_backup_due().await);

        clock.advance(chrono::Duration::hours(23));
        assert!(!manager.is_backup_due().await);
        clock.advance(chrono::Duration::hours(1));
        assert!(manager.is_backup_due().await);
    }

    #[tokio::test]
    async fn test_failed_upload_leaves_last_backup_unchanged() {
        let (manager, store, _, _) = session(7);
        manager.backup_now().await.unwrap();
        let before = manager.last_backup_time().await;

        // A cached folder that no longer exists makes the upload fail.
        *manager.container.lock().await = Some(ContainerRef {
            id: "deleted".to_string(),
            name: "gone".to_string(),
        });
        let err = manager.backup_now().await.unwrap_err();
        assert!(matches!(
            classify(&err),
            Some(ChatVaultError::Write {
                reason: WriteFailure::UploadFailed,
                ..
            })
        ));
        assert_eq!(manager.last_backup_time().await, before);
        assert_eq!(store.object_count(), 1);
        assert!(manager.status().borrow().is_error);
    }

    #[tokio::test]
    async fn test_prune_failure_does_not_fail_backup() {
        let (manager, store, _, clock) = session(1);
        manager.backup_now().await.unwrap();
        store.fail_all_deletes(true);
        clock.advance(chrono::Duration::minutes(1));

        let outcome = manager.backup_now().await.unwrap();
        assert_eq!(outcome.prune.failed.len(), 1);
        assert_eq!(manager.last_backup_time().await, Some(clock.now()));
        assert!(!manager.status().borrow().is_error);
    }

    #[tokio::test]
    async fn test_restore_roundtrip_and_empty_state() {
        let (manager, _, chats, _) = session(7);

        let err = manager.restore_latest().await.unwrap_err();
        assert!(matches!(
            classify(&err),
            Some(ChatVaultError::Restore {
                reason: RestoreFailure::NoBackupsFound,
                ..
            })
        ));
        assert_eq!(chats.restore_calls(), 0);

        let outcome = manager.backup_now().await.unwrap();
        let original = chats.chats();
        chats.set_chats(Vec::new());
        let restored = manager.restore_named(&outcome.snapshot.name).await.unwrap();
        assert_eq!(restored.id, outcome.snapshot.id);
        assert_eq!(chats.chats(), original);
    }

    #[tokio::test]
    async fn test_list_snapshots_newest_first() {
        let (manager, _, _, clock) = session(7);
        for _ in 0..3 {
            manager.backup_now().await.unwrap();
            clock.advance(chrono::Duration::minutes(5));
        }
        let listed = manager.list_snapshots().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed[0].created_time > listed[2].created_time);
    }
}
