//! Chats held in memory

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::chats::ChatSource;
use crate::error::Result;

#[derive(Debug, Default)]
struct State {
    chats: Vec<Value>,
    restore_calls: usize,
}

/// In-memory chat source that counts restores. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryChats {
    state: Arc<Mutex<State>>,
}

impl MemoryChats {
    /// Creates a source holding `chats`.
    pub fn new(chats: Vec<Value>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                chats,
                restore_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the current chats without counting a restore.
    pub fn set_chats(&self, chats: Vec<Value>) {
        self.lock().chats = chats;
    }

    /// Current chats.
    pub fn chats(&self) -> Vec<Value> {
        self.lock().chats.clone()
    }

    /// How many times [`ChatSource::restore_chats`] was called.
    pub fn restore_calls(&self) -> usize {
        self.lock().restore_calls
    }
}

#[async_trait::async_trait]
impl ChatSource for MemoryChats {
    async fn get_chats(&self) -> Result<Vec<Value>> {
        Ok(self.chats())
    }

    async fn restore_chats(&self, chats: Vec<Value>) -> Result<()> {
        let mut state = self.lock();
        state.chats = chats;
        state.restore_calls += 1;
        Ok(())
    }
}
