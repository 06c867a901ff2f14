//! Raw Store Module
//!
//! The policy-agnostic key-value substrate the envelope cache is built on.
//! Implementations store opaque bytes and track per-entry hit counters; they
//! know nothing about envelopes.

mod memory;

pub use memory::MemoryStore;

use regex::Regex;

// == Store Scope ==
/// Independently clearable regions of a raw store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    /// User data entries
    Cache,
    /// Secondary compiled-artifact cache
    Compiled,
}

// == Iteration Fields ==
/// Selects which fields `RawStore::iterate` fills in besides the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IterFields {
    pub value: bool,
    pub hits: bool,
}

impl IterFields {
    /// Keys only.
    pub const KEYS: IterFields = IterFields {
        value: false,
        hits: false,
    };
    /// Keys and raw values.
    pub const WITH_VALUES: IterFields = IterFields {
        value: true,
        hits: false,
    };
    /// Keys and hit counters.
    pub const WITH_HITS: IterFields = IterFields {
        value: false,
        hits: true,
    };
}

/// One item yielded by `RawStore::iterate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: String,
    pub value: Option<Vec<u8>>,
    pub hits: Option<u64>,
}

/// Per-entry bookkeeping, including entries whose native TTL has lapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    pub key: String,
    pub hits: u64,
    /// TTL in seconds as configured at write time, 0 = none
    pub ttl_secs: u64,
    /// Unix seconds
    pub created_at: i64,
}

/// Aggregate memory segment information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStats {
    pub available_bytes: u64,
    pub segment_count: u64,
    pub segment_size: u64,
}

/// Hit counter for one compiled artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStat {
    pub name: String,
    pub hits: u64,
}

// == Raw Store Trait ==
/// Narrow interface to the underlying in-memory key-value engine.
///
/// Every call is expected to be atomic on its own; nothing is atomic across
/// calls.
pub trait RawStore: Send + Sync {
    fn exists(&self, key: &str) -> bool;

    /// Returns the stored bytes and counts a hit.
    fn get_raw(&self, key: &str) -> Option<Vec<u8>>;

    fn set_raw(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> bool;

    fn delete(&self, key: &str) -> bool;

    /// Deletes every listed key, returning how many were actually removed.
    fn delete_batch(&self, keys: &[String]) -> usize {
        keys.iter().filter(|key| self.delete(key)).count()
    }

    /// Lazily walks live entries whose key matches `pattern`.
    ///
    /// Entries whose native TTL has lapsed are skipped.
    fn iterate(
        &self,
        pattern: Option<&Regex>,
        fields: IterFields,
    ) -> Box<dyn Iterator<Item = RawEntry> + '_>;

    fn entry_stats(&self) -> Vec<EntryStat>;

    fn segment_stats(&self) -> SegmentStats;

    fn artifact_stats(&self) -> Vec<ArtifactStat>;

    fn delete_artifact(&self, name: &str) -> bool;

    fn clear_scope(&self, scope: StoreScope) -> bool;
}
