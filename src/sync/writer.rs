//! Snapshot upload and retention pruning

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{classify, ChatVaultError, Result, WriteFailure};
use crate::store::{NewObject, RemoteStore};
use crate::sync::snapshot::{snapshot_name, SnapshotMeta, SnapshotPayload, SNAPSHOT_MIME_TYPE};

/// Outcome of a retention pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Snapshots left inside the retention window.
    pub kept: usize,
    /// Ids of snapshots deleted.
    pub deleted: Vec<String>,
    /// Ids of snapshots whose deletion failed.
    pub failed: Vec<String>,
}

/// Serializes `chats` taken at `now` and uploads them into `container_id`.
///
/// # Errors
///
/// Returns `serialize_failed` when the payload cannot be encoded and
/// `upload_failed` when the store rejects the upload. Authentication errors
/// (`token_invalid`, `user_cancelled`, ...) pass through unchanged so callers
/// can re-authenticate. Nothing is uploaded in either case, and the sync
/// manager leaves its last backup time as it was.
pub async fn write_snapshot(
    store: &dyn RemoteStore,
    container_id: &str,
    prefix: &str,
    chats: Vec<Value>,
    now: DateTime<Utc>,
) -> Result<SnapshotMeta> {
    let payload = SnapshotPayload::new(chats, now);
    let content = payload.to_bytes()?;
    let name = snapshot_name(prefix, now);

    tracing::debug!(
        "Uploading {} ({} chats, {} bytes)",
        name,
        payload.chats.len(),
        content.len()
    );

    let object = NewObject {
        name,
        parent_id: container_id.to_string(),
        content,
        mime_type: SNAPSHOT_MIME_TYPE.to_string(),
    };

    match store.create_object(object).await {
        Ok(meta) => {
            tracing::info!("Uploaded snapshot {} ({})", meta.name, meta.id);
            Ok(meta)
        }
        Err(e) if matches!(classify(&e), Some(ChatVaultError::Auth { .. })) => Err(e),
        Err(e) => Err(ChatVaultError::write(WriteFailure::UploadFailed, e.to_string()).into()),
    }
}

/// Deletes every snapshot beyond the `keep` newest in `container_id`.
///
/// Never fails: listing and delete failures are logged and reported, and
/// every remaining candidate is still attempted.
pub async fn prune_snapshots(
    store: &dyn RemoteStore,
    container_id: &str,
    keep: usize,
) -> PruneReport {
    let snapshots = match store.list_objects(container_id).await {
        Ok(mut snapshots) => {
            snapshots.sort_by(|a, b| b.created_time.cmp(&a.created_time));
            snapshots
        }
        Err(e) => {
            tracing::warn!("Skipping cleanup of old backups: listing failed: {}", e);
            return PruneReport::default();
        }
    };

    let mut report = PruneReport {
        kept: snapshots.len().min(keep),
        ..PruneReport::default()
    };

    for stale in snapshots.iter().skip(keep) {
        match store.delete_object(&stale.id).await {
            Ok(()) => {
                tracing::debug!("Deleted old backup {} ({})", stale.name, stale.id);
                report.deleted.push(stale.id.clone());
            }
            Err(e) => {
                tracing::warn!("Failed to delete old backup {} ({}): {}", stale.name, stale.id, e);
                report.failed.push(stale.id.clone());
            }
        }
    }

    if !report.deleted.is_empty() {
        tracing::info!("Removed {} old backup(s)", report.deleted.len());
    }
    report
}
