//! Cache Object Module
//!
//! Defines the immutable unit of storage: a payload plus its modification time.

use bytes::Bytes;
use chrono::{DateTime, SubsecRound, Utc};

// == Object ==
/// A cached payload and the time it was last modified.
///
/// Payloads are never mutated once stored; cloning shares the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    /// The stored bytes
    pub data: Bytes,
    /// Last modification time of the content
    pub modified: DateTime<Utc>,
}

impl Object {
    // == Constructor ==
    /// Creates a new object from a payload and timestamp.
    pub fn new(data: impl Into<Bytes>, modified: DateTime<Utc>) -> Self {
        Self {
            data: data.into(),
            modified,
        }
    }

    /// Creates an object stamped with the current time.
    pub fn now(data: impl Into<Bytes>) -> Self {
        Self::new(data, Utc::now())
    }

    // == Length ==
    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // == Same As ==
    /// Compares payloads byte for byte and timestamps to the second.
    ///
    /// Disk tiers do not keep sub-second precision, so this is the equality
    /// that survives a round trip through any backend.
    pub fn same_as(&self, other: &Object) -> bool {
        self.data == other.data
            && self.modified.trunc_subsecs(0) == other.modified.trunc_subsecs(0)
    }
}
