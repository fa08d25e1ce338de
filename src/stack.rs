//! Standard Cache Stack
//!
//! Builds the production topology: two size-split memory caches in front of
//! a disk cache.

use std::sync::Arc;

use tracing::info;

use crate::cache::{Cache, CacheStats, DiskCache, MemoryCache, MultiLevel, SplitSize, SplitSizeChild};
use crate::config::Config;
use crate::error::Result;

/// Handles to the assembled cache and each of its tiers.
///
/// Callers go through `cache`; the tier handles exist for diagnostics.
#[derive(Debug, Clone)]
pub struct CacheStack {
    /// Outermost cache: `[memory, disk]`
    pub cache: Arc<MultiLevel>,
    pub small: Arc<MemoryCache>,
    pub large: Arc<MemoryCache>,
    pub disk: Arc<DiskCache>,
}

/// Statistics of every tier in a [`CacheStack`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct StackStats {
    pub small: CacheStats,
    pub large: CacheStats,
    pub disk: CacheStats,
}

impl CacheStack {
    /// Opens the disk tier and wires up the stack from configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let disk = Arc::new(DiskCache::open(&config.cache_dir).await?);
        let small = Arc::new(MemoryCache::with_config(config.small_memory()));
        let large = Arc::new(MemoryCache::with_config(config.large_memory()));

        let memory = SplitSize::new([
            SplitSizeChild::new(config.small_object_limit, small.clone()),
            SplitSizeChild::new(config.large_object_limit, large.clone()),
        ]);
        let cache = Arc::new(MultiLevel::new([
            Arc::new(memory) as Arc<dyn Cache>,
            disk.clone() as Arc<dyn Cache>,
        ]));

        info!(
            "Cache stack ready: small={}B/{}B, large={}B/{}B, disk={}",
            config.small_memory_limit,
            config.small_object_limit,
            config.large_memory_limit,
            config.large_object_limit,
            disk.root().display()
        );

        Ok(Self {
            cache,
            small,
            large,
            disk,
        })
    }

    /// Collects statistics from every tier.
    pub async fn stats(&self) -> StackStats {
        StackStats {
            small: self.small.stats().await,
            large: self.large.stats().await,
            disk: self.disk.stats().await,
        }
    }
}
