//! Memory Cache Module
//!
//! Bounded in-process store with a total byte budget and a per-object ceiling.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::stats::StatsRecorder;
use crate::cache::{fill_or_not_found, wildcard_prefix, Cache, CacheStats, Filler, Object};
use crate::error::Result;

// == Memory Cache Config ==
/// Size limits of one memory cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryCacheConfig {
    /// Total payload bytes the cache may hold
    pub memory_limit: usize,
    /// Largest payload the cache stores, 0 for no limit
    pub object_limit: usize,
}

#[derive(Debug, Default)]
struct Entries {
    objects: HashMap<String, Object>,
    memory_usage: usize,
}

impl Entries {
    fn remove(&mut self, key: &str) -> bool {
        match self.objects.remove(key) {
            Some(old) => {
                self.memory_usage -= old.len();
                true
            }
            None => false,
        }
    }
}

// == Memory Cache ==
/// In-memory cache that flushes everything when its budget would overflow.
///
/// An optional backing cache answers local misses and receives write-through
/// sets. The backing reference is fixed at construction, so the chain of
/// backing caches is always acyclic.
pub struct MemoryCache {
    entries: RwLock<Entries>,
    config: MemoryCacheConfig,
    backing: Option<Arc<dyn Cache>>,
    stats: StatsRecorder,
}

impl MemoryCache {
    // == Constructor ==
    /// Creates a new MemoryCache.
    ///
    /// # Arguments
    /// * `memory_limit` - Maximum total payload bytes held at once
    /// * `object_limit` - Largest payload the cache will store, or 0 for no limit
    pub fn new(memory_limit: usize, object_limit: usize) -> Self {
        Self::with_config(MemoryCacheConfig {
            memory_limit,
            object_limit,
        })
    }

    /// Creates a new MemoryCache from a config struct.
    pub fn with_config(config: MemoryCacheConfig) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            config,
            backing: None,
            stats: StatsRecorder::default(),
        }
    }

    /// Puts `backing` below this cache for misses and write-through sets.
    pub fn backed_by(mut self, backing: Arc<dyn Cache>) -> Self {
        self.backing = Some(backing);
        self
    }

    /// Returns the configured limits.
    pub fn config(&self) -> MemoryCacheConfig {
        self.config
    }

    fn accepts(&self, size: usize) -> bool {
        let within_object_limit = self.config.object_limit == 0 || size <= self.config.object_limit;
        within_object_limit && size <= self.config.memory_limit
    }

    /// Stores locally without touching the backing cache.
    async fn store(&self, key: &str, object: Object) {
        let size = object.len();
        let mut entries = self.entries.write().await;
        entries.remove(key);

        if !self.accepts(size) {
            debug!("Not keeping {} ({} bytes) in memory", key, size);
            return;
        }

        if entries.memory_usage + size > self.config.memory_limit {
            info!(
                "Memory cache flushing {} entries ({} bytes) to fit {}",
                entries.objects.len(),
                entries.memory_usage,
                key
            );
            entries.objects.clear();
            entries.memory_usage = 0;
            self.stats.record_flush();
        }

        entries.objects.insert(key.to_string(), object);
        entries.memory_usage += size;
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub async fn len(&self) -> usize {
        self.entries.read().await.objects.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.objects.is_empty()
    }

    // == Memory Usage ==
    /// Returns the payload bytes currently held.
    pub async fn memory_usage(&self) -> usize {
        self.entries.read().await.memory_usage
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        self.stats
            .snapshot(entries.objects.len(), entries.memory_usage)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str, filler: Option<&dyn Filler>) -> Result<Object> {
        let found = self.entries.read().await.objects.get(key).cloned();
        if let Some(object) = found {
            self.stats.record_hit();
            return Ok(object);
        }

        match &self.backing {
            Some(backing) => {
                self.stats.record_miss(false);
                let object = backing.get(key, filler).await?;
                self.store(key, object.clone()).await;
                Ok(object)
            }
            None => {
                self.stats.record_miss(filler.is_some());
                fill_or_not_found(self, key, filler).await
            }
        }
    }

    async fn set(&self, key: &str, object: Object, write_through: bool) -> Result<()> {
        match (&self.backing, write_through) {
            (Some(backing), true) => {
                self.store(key, object.clone()).await;
                backing.set(key, object, true).await
            }
            _ => {
                self.store(key, object).await;
                Ok(())
            }
        }
    }

    async fn del(&self, pattern: &str) {
        {
            let mut entries = self.entries.write().await;
            match wildcard_prefix(pattern) {
                Some(prefix) => {
                    let matched: Vec<String> = entries
                        .objects
                        .keys()
                        .filter(|key| key.starts_with(prefix))
                        .cloned()
                        .collect();
                    for key in &matched {
                        entries.remove(key);
                    }
                    debug!("Deleted {} memory entries matching {}", matched.len(), pattern);
                }
                None => {
                    entries.remove(pattern);
                }
            }
        }

        if let Some(backing) = &self.backing {
            backing.del(pattern).await;
        }
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("config", &self.config)
            .field("backed", &self.backing.is_some())
            .finish()
    }
}
