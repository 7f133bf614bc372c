//! Cache Statistics Module
//!
//! Tracks cache effectiveness: hits, misses, upstream fetches and coalesced waits.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads answered from a fresh entry
    pub hits: u64,
    /// Reads that found nothing usable (absent, stale or unreadable)
    pub misses: u64,
    /// Upstream fetches started
    pub fetches: u64,
    /// Callers that attached to an already running fetch
    pub coalesced: u64,
    /// Upstream fetches that failed
    pub fetch_failures: u64,
    /// Keys removed by invalidate or scope sweeps
    pub invalidations: u64,
    /// Store or serialization failures swallowed by the cache
    pub store_errors: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    pub fn record_fetch_failure(&mut self) {
        self.fetch_failures += 1;
    }

    // == Record Invalidations ==
    /// Adds `count` removed keys to the invalidation counter.
    pub fn record_invalidations(&mut self, count: u64) {
        self.invalidations += count;
    }

    pub fn record_store_error(&mut self) {
        self.store_errors += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.fetches, 0);
        assert_eq!(stats.coalesced, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_fetch_counters() {
        let mut stats = CacheStats::new();
        stats.record_fetch();
        stats.record_coalesced();
        stats.record_coalesced();
        stats.record_fetch_failure();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.coalesced, 2);
        assert_eq!(stats.fetch_failures, 1);
    }

    #[test]
    fn test_record_invalidations() {
        let mut stats = CacheStats::new();
        stats.record_invalidations(3);
        stats.record_invalidations(1);
        assert_eq!(stats.invalidations, 4);
    }
}
