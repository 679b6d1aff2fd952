//! Remote store abstraction and implementations
//!
//! This module defines the [`RemoteStore`] trait every backend satisfies.
//! Concrete implementations live in submodules:
//!
//! - [`gdrive::GoogleDriveStore`] -- Google Drive v3 REST API.
//! - [`http::HttpServerStore`] -- a plain HTTP backup server speaking a small
//!   JSON protocol.
//! - [`memory::MemoryStore`] -- in-process store used by tests and dry runs.
//!
//! # Design
//!
//! The trait mirrors the handful of calls the snapshot lifecycle needs:
//! folder lookup and creation, object upload, listing, download and
//! deletion. Every call suspends until the backend answers; failures are
//! reported as [`ChatVaultError::Store`] with a [`StoreFailure`] class.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatVaultError, Result, StoreFailure};

pub mod gdrive;
pub mod http;
pub mod memory;

pub use gdrive::GoogleDriveStore;
pub use http::HttpServerStore;
pub use memory::MemoryStore;

/// A folder-like grouping in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Metadata of an object (snapshot file) in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Store-assigned identifier.
    pub id: String,
    /// File name.
    pub name: String,
    /// Creation time reported by the store.
    #[serde(rename = "createdTime")]
    pub created_time: DateTime<Utc>,
}

/// An object to upload.
#[derive(Debug, Clone)]
pub struct NewObject {
    /// File name.
    pub name: String,
    /// Identifier of the container to create the object in.
    pub parent_id: String,
    /// Raw content.
    pub content: Vec<u8>,
    /// MIME type of the content.
    pub mime_type: String,
}

/// Abstraction over remote file stores.
///
/// # Examples
///
/// ```
/// use chatvault::store::{MemoryStore, RemoteStore};
///
/// # #[tokio::main]
/// # async fn main() -> chatvault::error::Result<()> {
/// let store = MemoryStore::new();
/// let folder = store.create_container("Backups").await?;
/// assert_eq!(store.list_containers("Backups").await?, vec![folder]);
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// Non-trashed containers whose name equals `name`, in listing order.
    async fn list_containers(&self, name: &str) -> Result<Vec<ContainerRef>>;

    /// Creates a container named `name`.
    async fn create_container(&self, name: &str) -> Result<ContainerRef>;

    /// Uploads a new object and returns its metadata.
    async fn create_object(&self, object: NewObject) -> Result<ObjectMeta>;

    /// Objects in `parent_id`, newest first.
    async fn list_objects(&self, parent_id: &str) -> Result<Vec<ObjectMeta>>;

    /// Raw content of object `id`.
    async fn get_object_content(&self, id: &str) -> Result<Vec<u8>>;

    /// Deletes object `id`.
    async fn delete_object(&self, id: &str) -> Result<()>;
}

/// Maps an HTTP error status to a store failure class.
///
/// `403` is a quota failure when the body names a quota or rate limit
/// (Drive reports `storageQuotaExceeded` and `userRateLimitExceeded` that way).
pub(crate) fn classify_status(status: reqwest::StatusCode, body: &str) -> StoreFailure {
    match status.as_u16() {
        401 => StoreFailure::Permission,
        403 => {
            let lower = body.to_ascii_lowercase();
            if lower.contains("quota") || lower.contains("ratelimit") {
                StoreFailure::Quota
            } else {
                StoreFailure::Permission
            }
        }
        404 => StoreFailure::NotFound,
        429 | 507 => StoreFailure::Quota,
        _ => StoreFailure::Network,
    }
}

/// Wraps a transport error.
pub(crate) fn network_error(what: &str, err: reqwest::Error) -> anyhow::Error {
    ChatVaultError::store(StoreFailure::Network, format!("{what} failed: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED, ""), StoreFailure::Permission);
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "insufficientPermissions"),
            StoreFailure::Permission
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, r#"{"reason":"storageQuotaExceeded"}"#),
            StoreFailure::Quota
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, r#"{"reason":"userRateLimitExceeded"}"#),
            StoreFailure::Quota
        );
        assert_eq!(classify_status(StatusCode::NOT_FOUND, ""), StoreFailure::NotFound);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS, ""), StoreFailure::Quota);
        assert_eq!(classify_status(StatusCode::INTERNAL_SERVER_ERROR, ""), StoreFailure::Network);
    }

    #[test]
    fn test_object_meta_deserializes_drive_shape() {
        let meta: ObjectMeta = serde_json::from_str(
            r#"{
                "id": "f1",
                "name": "TypingMind_Backup_x.json",
                "createdTime": "2024-05-01T12:00:00.000Z"
            }"#,
        )
        .unwrap();
        assert_eq!(meta.id, "f1");
        assert_eq!(
            meta.created_time,
            "2024-05-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}
