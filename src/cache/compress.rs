//! Compression Helper Module
//!
//! Stores a payload alongside its gzip-compressed sibling under `<key>.gz`.

use std::io::Write;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use crate::cache::{Cache, Object, GZIP_SUFFIX};
use crate::error::{CacheError, Result};

/// Returns the key of the compressed sibling of `key`.
pub fn compressed_key(key: &str) -> String {
    if key.ends_with(GZIP_SUFFIX) {
        key.to_string()
    } else {
        format!("{key}{GZIP_SUFFIX}")
    }
}

/// Returns the key of the uncompressed variant of `key`.
pub fn uncompressed_key(key: &str) -> &str {
    key.strip_suffix(GZIP_SUFFIX).unwrap_or(key)
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder.write_all(data)?;
    encoder.finish()
}

// == Compress And Set ==
/// Compresses `data` and writes both variants of `key` into `cache`.
///
/// `key` may name either variant. Both objects are stamped with `modified`
/// and written with `write_through` set; the pair is returned as
/// `(uncompressed, compressed)`. A failure aborts immediately, so the
/// compressed write may have landed without the uncompressed one.
pub async fn compress_and_set(
    cache: &dyn Cache,
    key: &str,
    data: impl Into<Bytes>,
    modified: DateTime<Utc>,
) -> Result<(Object, Object)> {
    let data = data.into();
    let plain_key = uncompressed_key(key);
    let gz_key = compressed_key(key);

    let compressed = Object::new(gzip(&data).map_err(CacheError::Compression)?, modified);
    debug!(
        "Compressed {} from {} to {} bytes",
        plain_key,
        data.len(),
        compressed.len()
    );
    cache.set(&gz_key, compressed.clone(), true).await?;

    let uncompressed = Object::new(data, modified);
    cache.set(plain_key, uncompressed.clone(), true).await?;

    Ok((uncompressed, compressed))
}
