use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chatvault::auth::{CredentialProvider, OAuthToken};
use chatvault::chats::MemoryChats;
use chatvault::clock::ManualClock;
use chatvault::config::BackupConfig;
use chatvault::store::MemoryStore;
use chatvault::SyncManager;
use tempfile::TempDir;

/// Credential provider handing out a fixed token and counting invalidations.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct CountingCredential {
    pub issued: AtomicUsize,
    pub invalidated: AtomicUsize,
}

#[allow(dead_code)]
impl CountingCredential {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn invalidations(&self) -> usize {
        self.invalidated.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialProvider for CountingCredential {
    async fn credential(&self) -> chatvault::Result<OAuthToken> {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(OAuthToken::bearer("test-token"))
    }

    async fn invalidate(&self) {
        self.invalidated.fetch_add(1, Ordering::SeqCst);
    }
}

/// Session over an in-memory store and chat source sharing one clock.
#[allow(dead_code)]
pub struct Session {
    pub manager: Arc<SyncManager>,
    pub store: MemoryStore,
    pub chats: MemoryChats,
    pub clock: ManualClock,
}

#[allow(dead_code)]
pub fn session(keep: usize) -> Session {
    let clock = ManualClock::new("2024-05-01T12:00:00Z".parse().expect("valid start"));
    let store = MemoryStore::with_clock(Arc::new(clock.clone()));
    let chats = MemoryChats::new(vec![serde_json::json!({"id": "chat-1"})]);
    let settings = BackupConfig {
        keep_backups: keep,
        ..BackupConfig::default()
    };
    let manager = SyncManager::new(Arc::new(store.clone()), Arc::new(chats.clone()), settings)
        .with_clock(Arc::new(clock.clone()));
    Session {
        manager: Arc::new(manager),
        store,
        chats,
        clock,
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
