//! Test utilities for ChatVault
//!
//! This module provides common test utilities including temporary directory
//! management, test file creation, a frozen clock, an in-memory sync session
//! and assertion helpers.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::chats::MemoryChats;
use crate::clock::ManualClock;
use crate::config::{BackupConfig, Config};
use crate::store::MemoryStore;
use crate::sync::SyncManager;

/// Instant every test clock starts at.
pub const TEST_START: &str = "2024-05-01T12:00:00Z";

/// Create a temporary directory for testing
///
/// # Panics
///
/// Panics if the directory cannot be created
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: anyhow::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A clock frozen at [`TEST_START`].
pub fn test_clock() -> ManualClock {
    ManualClock::new(TEST_START.parse().expect("valid test start"))
}

/// Create a test configuration using the in-memory store
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.store.store_type = "memory".to_string();
    config
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
backup:
  folder_name: "Test Backups"
  file_prefix: "Test_Backup"
  frequency_hours: 1
  keep_backups: 3
  check_interval_seconds: 60
  backup_on_start: false
store:
  type: memory
chats:
  path: "chats.json"
"#
    .to_string()
}

/// An in-memory sync session sharing `clock` with its store.
pub struct TestSession {
    /// The session under test.
    pub manager: Arc<SyncManager>,
    /// Its store, for inspection and failure injection.
    pub store: MemoryStore,
    /// Its chat source.
    pub chats: MemoryChats,
    /// The shared clock.
    pub clock: ManualClock,
}

/// Builds a [`TestSession`] keeping `keep` snapshots.
pub fn test_session(keep: usize) -> TestSession {
    let clock = test_clock();
    let store = MemoryStore::with_clock(Arc::new(clock.clone()));
    let chats = MemoryChats::new(vec![serde_json::json!({"id": "chat-1", "title": "Hello"})]);
    let settings = BackupConfig {
        keep_backups: keep,
        ..BackupConfig::default()
    };
    let manager = SyncManager::new(Arc::new(store.clone()), Arc::new(chats.clone()), settings)
        .with_clock(Arc::new(clock.clone()));

    TestSession {
        manager: Arc::new(manager),
        store,
        chats,
        clock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::error::ChatVaultError;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: anyhow::Result<()> =
            Err(ChatVaultError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: anyhow::Result<()> =
            Err(ChatVaultError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config() {
        let config = test_config();
        assert_eq!(config.store.store_type, "memory");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_test_config_yaml() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.backup.keep_backups, 3);
        assert_eq!(config.backup.file_prefix, "Test_Backup");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_session_shares_clock() {
        let session = test_session(2);
        session.manager.backup_now().await.unwrap();
        assert_eq!(
            session.manager.last_backup_time().await,
            Some(session.clock.now())
        );
        assert_eq!(session.store.object_count(), 1);
    }
}
