//! Cache Statistics Module
//!
//! Tracks per-backend diagnostics: hits, misses, fills, flushes and removal failures.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of a backend's counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups answered from this backend
    pub hits: u64,
    /// Number of lookups this backend could not answer
    pub misses: u64,
    /// Number of times a filler was invoked on a miss
    pub fills: u64,
    /// Number of full flushes triggered by the memory budget
    pub flushes: u64,
    /// Number of failed removals swallowed by `del`
    pub removal_failures: u64,
    /// Current number of stored entries
    pub total_entries: usize,
    /// Current number of stored payload bytes
    pub total_bytes: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by readers and writers of a backend.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    fills: AtomicU64,
    flushes: AtomicU64,
    removal_failures: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self, filled: bool) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        if filled {
            self.fills.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removal_failure(&self) {
        self.removal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds a snapshot with the caller's current entry and byte counts.
    pub fn snapshot(&self, total_entries: usize, total_bytes: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fills: self.fills.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            removal_failures: self.removal_failures.load(Ordering::Relaxed),
            total_entries,
            total_bytes,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.flushes, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::default();
        recorder.record_hit();
        recorder.record_miss(false);
        assert_eq!(recorder.snapshot(0, 0).hit_rate(), 0.5);
    }

    #[test]
    fn test_miss_with_fill() {
        let recorder = StatsRecorder::default();
        recorder.record_miss(true);
        recorder.record_miss(false);
        let stats = recorder.snapshot(0, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.fills, 1);
    }

    #[test]
    fn test_snapshot_carries_sizes() {
        let recorder = StatsRecorder::default();
        recorder.record_flush();
        recorder.record_removal_failure();
        let stats = recorder.snapshot(3, 42);
        assert_eq!(stats.flushes, 1);
        assert_eq!(stats.removal_failures, 1);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_bytes, 42);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            hits: 4,
            ..CacheStats::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"hits\":4"));
        assert!(json.contains("removal_failures"));
    }
}
