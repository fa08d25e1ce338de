//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache backend and combinator.
///
/// Removal failures during `del` are deliberately absent: they are logged
/// and counted, never returned.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent and no filler supplied, or the filler reports the source is absent
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A filler failed to produce the object
    #[error("Fill failed for {key}: {source}")]
    Fill {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// A backend failed to read or persist an object
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Gzip compression of a payload failed
    #[error("Compression failed: {0}")]
    Compression(#[source] io::Error),

    /// Key cannot be mapped under the disk root
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl CacheError {
    /// Wraps an arbitrary filler failure for `key`.
    pub fn fill(key: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CacheError::Fill {
            key: key.into(),
            source: source.into(),
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CacheError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Returns true for the "content does not exist" case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
