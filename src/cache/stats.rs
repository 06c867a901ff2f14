//! Cache Statistics Module
//!
//! Tracks envelope cache activity: fetch hits and misses, writes, and bulk removals.

use serde::Serialize;

// == Cache Stats ==
/// Tracks envelope cache metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Fetches that returned a value
    pub hits: u64,
    /// Fetches that found nothing (absent or, when enforced, expired)
    pub misses: u64,
    /// Successful stores
    pub stores: u64,
    /// Stores refused because the key already existed
    pub refused: u64,
    /// Successful updates (replace or delta)
    pub updates: u64,
    /// Entries removed by the expiration sweep
    pub swept: u64,
    /// Entries removed by popularity purges
    pub purged: u64,
    /// Entries removed by pattern deletes
    pub pattern_deleted: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the fetch hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if nothing has been fetched.
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

    pub fn record_store(&mut self) {
        self.stores += 1;
    }

    pub fn record_refusal(&mut self) {
        self.refused += 1;
    }

    pub fn record_update(&mut self) {
        self.updates += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn record_purged(&mut self, count: usize) {
        self.purged += count as u64;
    }

    pub fn record_pattern_deleted(&mut self, count: usize) {
        self.pattern_deleted += count as u64;
    }
}

// == Gauge ==
/// Point-in-time view of the raw store backing a cache.
#[derive(Debug, Clone, Serialize)]
pub struct Gauge {
    /// Entries visible to iteration (native TTL not lapsed)
    pub live_entries: usize,
    /// Entries tracked by the store, lapsed ones included
    pub tracked_entries: usize,
    pub available_bytes: u64,
    pub free_memory_percent: f64,
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
        assert_eq!(stats.stores, 0);
        assert_eq!(stats.swept, 0);
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
    fn test_bulk_counters_accumulate() {
        let mut stats = CacheStats::new();
        stats.record_swept(2);
        stats.record_swept(3);
        stats.record_purged(4);
        stats.record_pattern_deleted(1);
        assert_eq!(stats.swept, 5);
        assert_eq!(stats.purged, 4);
        assert_eq!(stats.pattern_deleted, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new();
        stats.record_refusal();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["refused"], 1);
        assert_eq!(json["updates"], 0);
    }
}
