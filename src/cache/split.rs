//! Split Size Module
//!
//! Routes objects to child caches by payload size so a few large objects
//! cannot flush out many small ones.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{fill_or_not_found, Cache, Filler, Object};
use crate::error::Result;

// == Split Size Child ==
/// A child cache and the size class it accepts.
#[derive(Clone)]
pub struct SplitSizeChild {
    /// Objects strictly smaller than this go to `cache`; 0 accepts anything
    pub max_size: usize,
    pub cache: Arc<dyn Cache>,
}

impl SplitSizeChild {
    pub fn new(max_size: usize, cache: Arc<dyn Cache>) -> Self {
        Self { max_size, cache }
    }

    fn accepts(&self, size: usize) -> bool {
        self.max_size == 0 || size < self.max_size
    }

    fn sort_key(&self) -> usize {
        if self.max_size == 0 {
            usize::MAX
        } else {
            self.max_size
        }
    }
}

impl std::fmt::Debug for SplitSizeChild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitSizeChild")
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

// == Split Size ==
/// Combinator that sends each `set` to the smallest size class that fits.
///
/// `get` checks every child in order without promoting between them, and
/// `del` reaches every child.
#[derive(Debug, Clone, Default)]
pub struct SplitSize {
    children: Vec<SplitSizeChild>,
}

impl SplitSize {
    // == Constructor ==
    /// Creates a SplitSize over `children`, in any order.
    pub fn new(children: impl IntoIterator<Item = SplitSizeChild>) -> Self {
        let mut split = Self {
            children: children.into_iter().collect(),
        };
        split.sort();
        split
    }

    // == Add Child ==
    /// Adds a child cache and restores threshold order.
    ///
    /// Meant for setup; children are not changed while traffic flows.
    pub fn add_child(&mut self, max_size: usize, cache: Arc<dyn Cache>) {
        self.children.push(SplitSizeChild::new(max_size, cache));
        self.sort();
    }

    /// Returns the children in routing order.
    pub fn children(&self) -> &[SplitSizeChild] {
        &self.children
    }

    fn sort(&mut self) {
        self.children.sort_by_key(SplitSizeChild::sort_key);
    }
}

#[async_trait]
impl Cache for SplitSize {
    async fn get(&self, key: &str, filler: Option<&dyn Filler>) -> Result<Object> {
        for child in &self.children {
            if let Ok(object) = child.cache.get(key, None).await {
                return Ok(object);
            }
        }
        fill_or_not_found(self, key, filler).await
    }

    async fn set(&self, key: &str, object: Object, write_through: bool) -> Result<()> {
        let size = object.len();
        match self.children.iter().find(|child| child.accepts(size)) {
            Some(child) => child.cache.set(key, object, write_through).await,
            None => {
                debug!("No size class holds {} ({} bytes)", key, size);
                Ok(())
            }
        }
    }

    async fn del(&self, pattern: &str) {
        for child in &self.children {
            child.cache.del(pattern).await;
        }
    }
}
