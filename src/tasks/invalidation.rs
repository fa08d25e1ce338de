//! Invalidation Task
//!
//! Background task that deletes cache entries whose source content changed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{compressed_key, Cache, GZIP_SUFFIX, WILDCARD};

/// Spawns a task that deletes every key received on `changes`.
///
/// An exact key also drops its compressed sibling; a key ending in `*` is
/// deleted as a prefix wildcard. The task ends once every sender is dropped.
///
/// # Arguments
/// * `cache` - Shared cache to invalidate
/// * `changes` - Receiver of changed keys or wildcard patterns
///
/// # Returns
/// A JoinHandle for the spawned task, which can be aborted during shutdown.
///
/// # Example
/// ```ignore
/// let (tx, rx) = tokio::sync::mpsc::channel(64);
/// let handle = spawn_invalidation_task(cache.clone(), rx);
/// tx.send("posts/hello.html".to_string()).await?;
/// ```
pub fn spawn_invalidation_task(
    cache: Arc<dyn Cache>,
    mut changes: mpsc::Receiver<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting cache invalidation task");

        while let Some(key) = changes.recv().await {
            cache.del(&key).await;
            if !key.ends_with(WILDCARD) && !key.ends_with(GZIP_SUFFIX) {
                cache.del(&compressed_key(&key)).await;
            }
            debug!("Invalidated {}", key);
        }

        info!("Cache invalidation task stopped: all senders dropped");
    })
}
