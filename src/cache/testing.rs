//! Shared fixtures for cache unit tests.

use std::collections::BTreeMap;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use tokio::sync::RwLock;

use crate::cache::{fill_or_not_found, wildcard_prefix, Cache, Filler, Object};
use crate::error::{CacheError, Result};

/// Minimal map-backed cache with no limits.
#[derive(Debug, Default)]
pub struct DummyCache {
    objects: RwLock<BTreeMap<String, Object>>,
}

impl DummyCache {
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl Cache for DummyCache {
    async fn get(&self, key: &str, filler: Option<&dyn Filler>) -> Result<Object> {
        let found = self.objects.read().await.get(key).cloned();
        match found {
            Some(object) => Ok(object),
            None => fill_or_not_found(self, key, filler).await,
        }
    }

    async fn set(&self, key: &str, object: Object, _write_through: bool) -> Result<()> {
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn del(&self, pattern: &str) {
        let mut objects = self.objects.write().await;
        match wildcard_prefix(pattern) {
            Some(prefix) => objects.retain(|key, _| !key.starts_with(prefix)),
            None => {
                objects.remove(pattern);
            }
        }
    }
}

/// Filler that stores the key itself as the payload and counts invocations.
#[derive(Debug, Default)]
pub struct KeyFiller {
    calls: AtomicUsize,
    fail: bool,
}

impl KeyFiller {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Filler for KeyFiller {
    async fn fill(&self, cache: &dyn Cache, key: &str) -> Result<Object> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CacheError::fill(key, anyhow::anyhow!("test filler error")));
        }
        let object = Object::now(key.as_bytes().to_vec());
        cache.set(key, object.clone(), true).await?;
        Ok(object)
    }
}

pub fn simple_object(len: usize) -> Object {
    Object::now(vec![0u8; len])
}

/// Keys shaped like `<prefix><i / 10>/<i>`.
pub fn generate_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{}/{i}", i / 10)).collect()
}

pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

pub const WILDCARD_KEYS: [&str; 6] = ["abc", "abd", "subdir/abc", "subdir/abd", "ddd", "subdir/ddd"];

/// Sets every wildcard fixture key, deletes `subdir/a*`, and checks survivors.
pub async fn check_wildcard_delete(cache: &dyn Cache) {
    for key in WILDCARD_KEYS {
        cache.set(key, Object::now(key.as_bytes().to_vec()), false).await.unwrap();
    }

    cache.del("subdir/a*").await;

    for key in ["subdir/abc", "subdir/abd"] {
        assert!(cache.get(key, None).await.is_err(), "{key} survived wildcard delete");
    }
    for key in ["abc", "abd", "ddd", "subdir/ddd"] {
        let object = cache.get(key, None).await.unwrap();
        assert_eq!(object.data.as_ref(), key.as_bytes(), "{key} content changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_cache_fills_misses() {
        let cache = DummyCache::default();
        let filler = KeyFiller::default();

        assert!(matches!(cache.get("a", None).await, Err(CacheError::NotFound(_))));
        let object = cache.get("a", Some(&filler)).await.unwrap();
        assert_eq!(object.data.as_ref(), b"a");
        cache.get("a", Some(&filler)).await.unwrap();
        assert_eq!(filler.calls(), 1);
    }
}
