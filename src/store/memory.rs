//! In-process remote store
//!
//! Keeps containers and objects in memory. Creation times come from a shared
//! [`Clock`], with an insertion sequence breaking ties, so listings are
//! deterministic under a frozen clock. Deletes can be made to fail for
//! specific objects to exercise best-effort pruning, and uploads can be made
//! to fail as if the credential had been revoked.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::{Clock, SystemClock};
use crate::error::{AuthFailure, ChatVaultError, Result, StoreFailure};
use crate::store::{ContainerRef, NewObject, ObjectMeta, RemoteStore};

#[derive(Debug, Clone)]
struct StoredObject {
    meta: ObjectMeta,
    parent_id: String,
    content: Vec<u8>,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    containers: Vec<ContainerRef>,
    objects: Vec<StoredObject>,
    next_seq: u64,
    failing_deletes: HashSet<String>,
    fail_all_deletes: bool,
    fail_listing: bool,
    reject_uploads: bool,
    calls: Vec<String>,
}

/// Remote store that lives in process memory.
///
/// Clones share state.
///
/// # Examples
///
/// ```
/// use chatvault::store::{MemoryStore, NewObject, RemoteStore};
///
/// # #[tokio::main]
/// # async fn main() -> chatvault::error::Result<()> {
/// let store = MemoryStore::new();
/// let folder = store.create_container("Backups").await?;
/// store
///     .create_object(NewObject {
///         name: "a.json".to_string(),
///         parent_id: folder.id.clone(),
///         content: b"{}".to_vec(),
///         mime_type: "application/json".to_string(),
///     })
///     .await?;
/// assert_eq!(store.list_objects(&folder.id).await?.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store stamping objects with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes every later delete of `id` fail with a network error.
    pub fn fail_delete_of(&self, id: impl Into<String>) {
        self.lock().failing_deletes.insert(id.into());
    }

    /// Makes every later delete fail (or succeed again with `false`).
    pub fn fail_all_deletes(&self, fail: bool) {
        self.lock().fail_all_deletes = fail;
    }

    /// Makes `list_objects` fail (or succeed again with `false`).
    pub fn fail_listing(&self, fail: bool) {
        self.lock().fail_listing = fail;
    }

    /// Makes `create_object` fail with an invalid-token error (or succeed
    /// again with `false`).
    pub fn reject_uploads(&self, reject: bool) {
        self.lock().reject_uploads = reject;
    }

    /// Adds a container directly, bypassing name checks. Lets tests set up
    /// duplicate folders.
    pub fn insert_container(&self, name: impl Into<String>) -> ContainerRef {
        let container = ContainerRef {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        };
        self.lock().containers.push(container.clone());
        container
    }

    /// Number of containers named `name`.
    pub fn container_count(&self, name: &str) -> usize {
        self.lock().containers.iter().filter(|c| c.name == name).count()
    }

    /// Number of objects across all containers.
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Names of the calls made so far, e.g. `"list_objects"`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn record(state: &mut State, call: &str) {
        state.calls.push(call.to_string());
    }
}

#[async_trait::async_trait]
impl RemoteStore for MemoryStore {
    async fn list_containers(&self, name: &str) -> Result<Vec<ContainerRef>> {
        let mut state = self.lock();
        Self::record(&mut state, "list_containers");
        Ok(state
            .containers
            .iter()
            .filter(|c| c.name == name)
            .cloned()
            .collect())
    }

    async fn create_container(&self, name: &str) -> Result<ContainerRef> {
        Self::record(&mut self.lock(), "create_container");
        Ok(self.insert_container(name))
    }

    async fn create_object(&self, object: NewObject) -> Result<ObjectMeta> {
        let now = self.clock.now();
        let mut state = self.lock();
        Self::record(&mut state, "create_object");

        if state.reject_uploads {
            return Err(
                ChatVaultError::auth(AuthFailure::TokenInvalid, "simulated revoked token").into(),
            );
        }

        if !state.containers.iter().any(|c| c.id == object.parent_id) {
            return Err(ChatVaultError::store(
                StoreFailure::NotFound,
                format!("container {} does not exist", object.parent_id),
            )
            .into());
        }

        let meta = ObjectMeta {
            id: uuid::Uuid::new_v4().to_string(),
            name: object.name,
            created_time: now,
        };
        let seq = state.next_seq;
        state.next_seq += 1;
        state.objects.push(StoredObject {
            meta: meta.clone(),
            parent_id: object.parent_id,
            content: object.content,
            seq,
        });
        Ok(meta)
    }

    async fn list_objects(&self, parent_id: &str) -> Result<Vec<ObjectMeta>> {
        let mut state = self.lock();
        Self::record(&mut state, "list_objects");

        if state.fail_listing {
            return Err(ChatVaultError::store(
                StoreFailure::Network,
                "simulated listing failure",
            )
            .into());
        }

        let mut objects: Vec<&StoredObject> = state
            .objects
            .iter()
            .filter(|o| o.parent_id == parent_id)
            .collect();
        objects.sort_by(|a, b| {
            b.meta
                .created_time
                .cmp(&a.meta.created_time)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(objects.into_iter().map(|o| o.meta.clone()).collect())
    }

    async fn get_object_content(&self, id: &str) -> Result<Vec<u8>> {
        let mut state = self.lock();
        Self::record(&mut state, "get_object_content");
        state
            .objects
            .iter()
            .find(|o| o.meta.id == id)
            .map(|o| o.content.clone())
            .ok_or_else(|| {
                ChatVaultError::store(StoreFailure::NotFound, format!("object {id} does not exist"))
                    .into()
            })
    }

    async fn delete_object(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        Self::record(&mut state, "delete_object");

        if state.fail_all_deletes || state.failing_deletes.contains(id) {
            return Err(ChatVaultError::store(
                StoreFailure::Network,
                format!("simulated delete failure for {id}"),
            )
            .into());
        }

        let before = state.objects.len();
        state.objects.retain(|o| o.meta.id != id);
        if state.objects.len() == before {
            return Err(ChatVaultError::store(
                StoreFailure::NotFound,
                format!("object {id} does not exist"),
            )
            .into());
        }
        Ok(())
    }
}
