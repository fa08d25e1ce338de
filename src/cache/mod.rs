//! Cache Module
//!
//! Layered object caching: the `Cache`/`Filler` contracts, a bounded memory
//! store, a filesystem store, and the size-split and multi-level combinators.

mod compress;
mod disk;
mod memory;
mod multilevel;
mod object;
mod split;
mod stats;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use compress::{compress_and_set, compressed_key, uncompressed_key};
pub use disk::DiskCache;
pub use memory::{MemoryCache, MemoryCacheConfig};
pub use multilevel::MultiLevel;
pub use object::Object;
pub use split::{SplitSize, SplitSizeChild};
pub use stats::CacheStats;

// == Public Constants ==
/// Suffix marking the compressed sibling of a key
pub const GZIP_SUFFIX: &str = ".gz";

/// Trailing character that turns a `del` key into a prefix wildcard
pub const WILDCARD: char = '*';

// == Cache ==
/// The capability every backend and combinator implements.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the stored object, or hands the miss to `filler`.
    ///
    /// With no filler a miss fails with [`CacheError::NotFound`](crate::CacheError::NotFound).
    /// A filler's result, error included, is returned unmodified.
    async fn get(&self, key: &str, filler: Option<&dyn Filler>) -> Result<Object>;

    /// Stores `object` under `key`, overwriting any existing entry.
    ///
    /// `write_through` is honored only by caches with a tier below them.
    async fn set(&self, key: &str, object: Object, write_through: bool) -> Result<()>;

    /// Removes `key`, or every key sharing the prefix when it ends in `*`.
    ///
    /// Never fails; removal problems are logged.
    async fn del(&self, pattern: &str);
}

// == Filler ==
/// Produces an object on a cache miss.
///
/// Nothing prevents two callers from filling the same key at once, so
/// implementations must tolerate running concurrently.
#[async_trait]
pub trait Filler: Send + Sync {
    /// Builds the object for `key`, optionally storing it into `cache`.
    async fn fill(&self, cache: &dyn Cache, key: &str) -> Result<Object>;
}

/// Splits a `del` argument into its prefix when it is a wildcard.
pub(crate) fn wildcard_prefix(pattern: &str) -> Option<&str> {
    pattern.strip_suffix(WILDCARD)
}

/// Shared miss path: delegate to the filler or report the key as absent.
pub(crate) async fn fill_or_not_found(
    cache: &dyn Cache,
    key: &str,
    filler: Option<&dyn Filler>,
) -> Result<Object> {
    match filler {
        Some(filler) => filler.fill(cache, key).await,
        None => Err(crate::error::CacheError::NotFound(key.to_string())),
    }
}
