//! Backup folder resolution

use crate::error::Result;
use crate::store::{ContainerRef, RemoteStore};

/// Finds the container named `name`, creating it when none exists.
///
/// When the store holds several containers with that name the first one
/// listed is used and no new one is created. Calling this again after a
/// success returns the same container.
///
/// # Errors
///
/// Returns the store error when listing or creation fails.
///
/// # Examples
///
/// ```
/// use chatvault::store::MemoryStore;
/// use chatvault::sync::resolve_container;
///
/// # #[tokio::main]
/// # async fn main() -> chatvault::error::Result<()> {
/// let store = MemoryStore::new();
/// let first = resolve_container(&store, "Backups").await?;
/// let second = resolve_container(&store, "Backups").await?;
/// assert_eq!(first, second);
/// # Ok(())
/// # }
/// ```
pub async fn resolve_container(store: &dyn RemoteStore, name: &str) -> Result<ContainerRef> {
    let mut found = store.list_containers(name).await?;

    if found.len() > 1 {
        tracing::warn!(
            "Found {} folders named {:?}; using the first ({})",
            found.len(),
            name,
            found[0].id
        );
    }

    if !found.is_empty() {
        let container = found.swap_remove(0);
        tracing::debug!("Using existing folder {} ({})", container.name, container.id);
        return Ok(container);
    }

    let container = store.create_container(name).await?;
    tracing::info!("Created backup folder {:?} ({})", container.name, container.id);
    Ok(container)
}
