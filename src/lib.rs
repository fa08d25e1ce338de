//! Tiercache - A layered, capacity-bounded object cache
//!
//! Avoids recomputing expensive derived artifacts by caching them in bounded
//! memory tiers backed by a filesystem tier, filling misses on demand.

pub mod cache;
pub mod config;
pub mod error;
pub mod stack;
pub mod tasks;

pub use cache::{
    compress_and_set, Cache, CacheStats, DiskCache, Filler, MemoryCache, MemoryCacheConfig,
    MultiLevel, Object, SplitSize, SplitSizeChild,
};
pub use config::Config;
pub use error::{CacheError, Result};
pub use stack::CacheStack;
pub use tasks::spawn_invalidation_task;
