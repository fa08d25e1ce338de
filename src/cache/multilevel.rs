//! Multi Level Module
//!
//! Composes ordered cache tiers, fastest first, and promotes lower-tier hits.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{fill_or_not_found, Cache, Filler, Object};
use crate::error::Result;

// == Multi Level ==
/// Ordered list of cache tiers.
///
/// A hit at tier `i` is copied into tiers `0..i`. A miss everywhere runs the
/// filler once with the MultiLevel itself as the cache, so whatever it
/// stores lands in every tier.
#[derive(Clone, Default)]
pub struct MultiLevel {
    tiers: Vec<Arc<dyn Cache>>,
}

impl MultiLevel {
    /// Creates a MultiLevel over `tiers`, fastest first.
    pub fn new(tiers: impl IntoIterator<Item = Arc<dyn Cache>>) -> Self {
        Self {
            tiers: tiers.into_iter().collect(),
        }
    }

    pub fn tiers(&self) -> &[Arc<dyn Cache>] {
        &self.tiers
    }
}

impl std::fmt::Debug for MultiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiLevel")
            .field("tiers", &self.tiers.len())
            .finish()
    }
}

#[async_trait]
impl Cache for MultiLevel {
    async fn get(&self, key: &str, filler: Option<&dyn Filler>) -> Result<Object> {
        for (level, tier) in self.tiers.iter().enumerate() {
            let Ok(object) = tier.get(key, None).await else {
                continue;
            };

            for upper in self.tiers[..level].iter().rev() {
                if let Err(err) = upper.set(key, object.clone(), false).await {
                    warn!("Could not promote {} from tier {}: {}", key, level, err);
                }
            }
            if level > 0 {
                debug!("Promoted {} from tier {}", key, level);
            }
            return Ok(object);
        }

        fill_or_not_found(self, key, filler).await
    }

    async fn set(&self, key: &str, object: Object, write_through: bool) -> Result<()> {
        for tier in &self.tiers {
            tier.set(key, object.clone(), write_through).await?;
        }
        Ok(())
    }

    async fn del(&self, pattern: &str) {
        for tier in &self.tiers {
            tier.del(pattern).await;
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::{simple_object, DummyCache, KeyFiller};
    use crate::error::CacheError;

    fn make_levels() -> (MultiLevel, Vec<Arc<DummyCache>>) {
        let levels: Vec<Arc<DummyCache>> = (0..3).map(|_| Arc::new(DummyCache::default())).collect();
        let multi = MultiLevel::new(levels.iter().map(|level| level.clone() as Arc<dyn Cache>));
        (multi, levels)
    }

    async fn present_everywhere(levels: &[Arc<DummyCache>], key: &str) -> bool {
        for level in levels {
            if level.get(key, None).await.is_err() {
                return false;
            }
        }
        true
    }

    #[tokio::test]
    async fn test_multilevel_set_reaches_all_levels() {
        let (multi, levels) = make_levels();
        multi.set("abc", simple_object(8), false).await.unwrap();
        assert!(present_everywhere(&levels, "abc").await);
    }

    #[tokio::test]
    async fn test_multilevel_get_from_top_does_not_fill_lower() {
        let (multi, levels) = make_levels();
        multi.set("abc", simple_object(8), false).await.unwrap();
        levels[1].del("abc").await;
        levels[2].del("abc").await;

        assert!(multi.get("abc", None).await.is_ok());
        assert!(levels[1].get("abc", None).await.is_err());
    }

    #[tokio::test]
    async fn test_multilevel_promotes_lower_hits() {
        let (multi, levels) = make_levels();
        levels[2].set("abc", simple_object(8), false).await.unwrap();

        assert!(multi.get("abc", None).await.is_ok());
        assert!(present_everywhere(&levels, "abc").await);
    }

    #[tokio::test]
    async fn test_multilevel_delete() {
        let (multi, levels) = make_levels();
        multi.set("abc", simple_object(8), false).await.unwrap();

        multi.del("abc").await;
        assert!(matches!(
            multi.get("abc", None).await,
            Err(CacheError::NotFound(_))
        ));
        for level in &levels {
            assert!(level.get("abc", None).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_multilevel_filler_sets_all_levels() {
        let (multi, levels) = make_levels();
        let filler = KeyFiller::default();

        multi.get("abc", Some(&filler)).await.unwrap();
        assert!(present_everywhere(&levels, "abc").await);

        multi.get("abc", Some(&filler)).await.unwrap();
        assert_eq!(filler.calls(), 1);
    }

    #[tokio::test]
    async fn test_multilevel_filler_error() {
        let (multi, _levels) = make_levels();
        let filler = KeyFiller::failing();

        let result = multi.get("aaa", Some(&filler)).await;
        assert!(matches!(result, Err(CacheError::Fill { .. })));
    }

    #[tokio::test]
    async fn test_multilevel_set_stops_at_first_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let disk: Arc<dyn Cache> = Arc::new(crate::cache::DiskCache::open(dir.path()).await.unwrap());
        let top = Arc::new(DummyCache::default());
        let bottom = Arc::new(DummyCache::default());
        let multi = MultiLevel::new([
            top.clone() as Arc<dyn Cache>,
            disk,
            bottom.clone() as Arc<dyn Cache>,
        ]);

        let result = multi.set("../escape", simple_object(4), false).await;
        assert!(matches!(result, Err(CacheError::InvalidKey(_))));
        assert!(top.get("../escape", None).await.is_ok());
        assert!(bottom.get("../escape", None).await.is_err());
    }
}
