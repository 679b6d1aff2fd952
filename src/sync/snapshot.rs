//! Snapshot payload and naming

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChatVaultError, Result, WriteFailure};

/// Payload format version written into every snapshot.
pub const SCHEMA_VERSION: &str = "1.0";

/// MIME type of snapshot objects.
pub const SNAPSHOT_MIME_TYPE: &str = "application/json";

/// Metadata of a stored snapshot.
pub type SnapshotMeta = crate::store::ObjectMeta;

/// Contents of a snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    /// ISO-8601 time the snapshot was taken.
    #[serde(default)]
    pub timestamp: String,
    /// Chat records exactly as the chat source returned them.
    pub chats: Vec<Value>,
    /// Payload format version.
    #[serde(default)]
    pub version: String,
}

impl SnapshotPayload {
    /// Builds a current-version payload taken at `now`.
    pub fn new(chats: Vec<Value>, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: iso_timestamp(now),
            chats,
            version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Serializes the payload as UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns a `serialize_failed` write error if a chat record cannot be
    /// encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            ChatVaultError::write(WriteFailure::SerializeFailed, e.to_string()).into()
        })
    }

    /// `true` when the payload was written by this format version.
    pub fn is_current_version(&self) -> bool {
        self.version == SCHEMA_VERSION
    }
}

/// `2024-05-01T12:00:00.000Z`: millisecond precision, `Z` suffix.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Snapshot file name for a backup taken at `now`.
///
/// Colons are replaced so the name is valid on every file system; names
/// sort lexicographically in time order.
///
/// # Examples
///
/// ```
/// use chatvault::sync::snapshot::snapshot_name;
///
/// let now = "2024-05-01T12:00:00Z".parse().unwrap();
/// assert_eq!(
///     snapshot_name("TypingMind_Backup", now),
///     "TypingMind_Backup_2024-05-01T12-00-00.000Z.json"
/// );
/// ```
pub fn snapshot_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}_{}.json", prefix, iso_timestamp(now).replace(':', "-"))
}
