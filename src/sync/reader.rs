//! Snapshot listing and restore
//!
//! A restore either hands the complete chat array of one snapshot to the
//! [`ChatSource`] or leaves local chats untouched: nothing is passed on until
//! the snapshot has been downloaded and parsed.

use crate::chats::ChatSource;
use crate::error::{ChatVaultError, RestoreFailure, Result};
use crate::store::RemoteStore;
use crate::sync::snapshot::{SnapshotMeta, SnapshotPayload, SCHEMA_VERSION};

/// Snapshots in `container_id`, newest first.
///
/// # Errors
///
/// Returns the store error when listing fails.
pub async fn list_snapshots(
    store: &dyn RemoteStore,
    container_id: &str,
) -> Result<Vec<SnapshotMeta>> {
    let mut snapshots = store.list_objects(container_id).await?;
    // Stable, so equal times keep the store's order.
    snapshots.sort_by(|a, b| b.created_time.cmp(&a.created_time));
    Ok(snapshots)
}

/// Restores the newest snapshot in `container_id` into `chats`.
///
/// # Errors
///
/// Returns `no_backups_found` for an empty container (the chat source is not
/// touched), or the errors of [`restore_snapshot`].
pub async fn restore_latest(
    store: &dyn RemoteStore,
    container_id: &str,
    chats: &dyn ChatSource,
) -> Result<SnapshotMeta> {
    let latest = list_snapshots(store, container_id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ChatVaultError::restore(RestoreFailure::NoBackupsFound, "the backup folder is empty")
        })?;

    restore_snapshot(store, &latest, chats).await?;
    Ok(latest)
}

/// Restores the snapshot whose id, or failing that name, is `id_or_name`.
///
/// # Errors
///
/// Returns `no_backups_found` for an empty container, `fetch_failed` when no
/// snapshot matches, or the errors of [`restore_snapshot`].
pub async fn restore_named(
    store: &dyn RemoteStore,
    container_id: &str,
    id_or_name: &str,
    chats: &dyn ChatSource,
) -> Result<SnapshotMeta> {
    let snapshots = list_snapshots(store, container_id).await?;
    if snapshots.is_empty() {
        return Err(ChatVaultError::restore(
            RestoreFailure::NoBackupsFound,
            "the backup folder is empty",
        )
        .into());
    }

    let chosen = snapshots
        .iter()
        .find(|s| s.id == id_or_name)
        .or_else(|| snapshots.iter().find(|s| s.name == id_or_name))
        .cloned()
        .ok_or_else(|| {
            ChatVaultError::restore(
                RestoreFailure::FetchFailed,
                format!("no backup named {id_or_name:?} in the backup folder"),
            )
        })?;

    restore_snapshot(store, &chosen, chats).await?;
    Ok(chosen)
}

/// Downloads and parses `snapshot`, then hands its chats to `chats`.
///
/// A payload written by another format version is accepted with a warning.
///
/// # Errors
///
/// Returns `fetch_failed` when the download fails, `parse_failed` when the
/// content is not a snapshot payload, or the chat source's error.
pub async fn restore_snapshot(
    store: &dyn RemoteStore,
    snapshot: &SnapshotMeta,
    chats: &dyn ChatSource,
) -> Result<()> {
    let content = store.get_object_content(&snapshot.id).await.map_err(|e| {
        ChatVaultError::restore(
            RestoreFailure::FetchFailed,
            format!("could not download {}: {}", snapshot.name, e),
        )
    })?;

    let payload: SnapshotPayload = serde_json::from_slice(&content).map_err(|e| {
        ChatVaultError::restore(
            RestoreFailure::ParseFailed,
            format!("{} is not a valid backup: {}", snapshot.name, e),
        )
    })?;

    if !payload.is_current_version() {
        tracing::warn!(
            "Backup {} has format version {:?} (expected {}); restoring anyway",
            snapshot.name,
            payload.version,
            SCHEMA_VERSION
        );
    }

    let count = payload.chats.len();
    chats.restore_chats(payload.chats).await?;
    tracing::info!("Restored {} chats from {}", count, snapshot.name);
    Ok(())
}
