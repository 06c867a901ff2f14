//! In-Memory Raw Store
//!
//! Reference `RawStore` backed by a HashMap, sized as a fixed set of memory
//! segments. Native expiry is only applied by `iterate`; point reads still see
//! lapsed entries until someone deletes them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::raw::{
    ArtifactStat, EntryStat, IterFields, RawEntry, RawStore, SegmentStats, StoreScope,
};

// == Stored Entry ==
#[derive(Debug)]
struct StoredEntry {
    value: Vec<u8>,
    ttl_secs: u64,
    created_at: i64,
    hits: AtomicU64,
}

impl StoredEntry {
    fn is_lapsed(&self, now: i64) -> bool {
        self.ttl_secs != 0 && self.created_at.saturating_add(self.ttl_secs as i64) < now
    }

    fn footprint(key: &str, value: &[u8]) -> u64 {
        (key.len() + value.len()) as u64
    }
}

// == Entry Table ==
/// Entries plus their total footprint, kept in step under one lock.
#[derive(Debug, Default)]
struct EntryTable {
    map: HashMap<String, StoredEntry>,
    used_bytes: u64,
}

impl EntryTable {
    fn footprint_of(&self, key: &str) -> u64 {
        self.map
            .get(key)
            .map(|entry| StoredEntry::footprint(key, &entry.value))
            .unwrap_or(0)
    }

    fn insert(&mut self, key: &str, entry: StoredEntry) {
        let added = StoredEntry::footprint(key, &entry.value);
        if let Some(old) = self.map.insert(key.to_string(), entry) {
            self.used_bytes -= StoredEntry::footprint(key, &old.value);
        }
        self.used_bytes += added;
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.map.remove(key) {
            Some(old) => {
                self.used_bytes -= StoredEntry::footprint(key, &old.value);
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.used_bytes = 0;
    }
}

// == Memory Store ==
/// Process-local raw store.
pub struct MemoryStore {
    entries: RwLock<EntryTable>,
    artifacts: RwLock<HashMap<String, u64>>,
    clock: Arc<dyn Clock>,
    segment_count: u64,
    segment_size: u64,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store with `segment_count` segments of `segment_size` bytes.
    pub fn new(segment_count: u64, segment_size: u64, clock: Arc<dyn Clock>) -> Self {
        debug!(
            "Initializing memory store with {} segments of {} bytes",
            segment_count, segment_size
        );
        Self {
            entries: RwLock::new(EntryTable::default()),
            artifacts: RwLock::new(HashMap::new()),
            clock,
            segment_count,
            segment_size,
        }
    }

    fn capacity(&self) -> u64 {
        self.segment_count.saturating_mul(self.segment_size)
    }

    // == Compiled Artifacts ==
    /// Registers a compiled artifact with a zero hit count.
    pub fn register_artifact(&self, name: &str) {
        self.artifacts.write().entry(name.to_string()).or_insert(0);
    }

    /// Records a hit on a compiled artifact. Returns false if it is unknown.
    pub fn hit_artifact(&self, name: &str) -> bool {
        match self.artifacts.write().get_mut(name) {
            Some(hits) => {
                *hits += 1;
                true
            }
            None => false,
        }
    }

    // == Length ==
    /// Returns the number of stored entries, lapsed ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().map.is_empty()
    }
}

impl RawStore for MemoryStore {
    fn exists(&self, key: &str) -> bool {
        self.entries.read().map.contains_key(key)
    }

    fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        entries.map.get(key).map(|entry| {
            entry.hits.fetch_add(1, Ordering::Relaxed);
            entry.value.clone()
        })
    }

    fn set_raw(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> bool {
        let mut entries = self.entries.write();

        // Replacing an entry frees its old footprint first
        let used = entries.used_bytes - entries.footprint_of(key);
        if used + StoredEntry::footprint(key, &value) > self.capacity() {
            warn!("Memory store full, rejecting write for key={}", key);
            return false;
        }

        entries.insert(
            key,
            StoredEntry {
                value,
                ttl_secs,
                created_at: self.clock.now(),
                hits: AtomicU64::new(0),
            },
        );
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key)
    }

    fn delete_batch(&self, keys: &[String]) -> usize {
        let mut entries = self.entries.write();
        keys.iter().filter(|key| entries.remove(key)).count()
    }

    fn iterate(
        &self,
        pattern: Option<&Regex>,
        fields: IterFields,
    ) -> Box<dyn Iterator<Item = RawEntry> + '_> {
        let now = self.clock.now();
        // Only keys and counters are snapshotted; values are read per item.
        let matched: Vec<(String, u64)> = self
            .entries
            .read()
            .map
            .iter()
            .filter(|(key, entry)| {
                !entry.is_lapsed(now) && pattern.map_or(true, |re| re.is_match(key))
            })
            .map(|(key, entry)| (key.clone(), entry.hits.load(Ordering::Relaxed)))
            .collect();

        Box::new(MemoryIter {
            store: self,
            items: matched.into_iter(),
            fields,
        })
    }

    fn entry_stats(&self) -> Vec<EntryStat> {
        self.entries
            .read()
            .map
            .iter()
            .map(|(key, entry)| EntryStat {
                key: key.clone(),
                hits: entry.hits.load(Ordering::Relaxed),
                ttl_secs: entry.ttl_secs,
                created_at: entry.created_at,
            })
            .collect()
    }

    fn segment_stats(&self) -> SegmentStats {
        let used = self.entries.read().used_bytes;
        SegmentStats {
            available_bytes: self.capacity().saturating_sub(used),
            segment_count: self.segment_count,
            segment_size: self.segment_size,
        }
    }

    fn artifact_stats(&self) -> Vec<ArtifactStat> {
        self.artifacts
            .read()
            .iter()
            .map(|(name, hits)| ArtifactStat {
                name: name.clone(),
                hits: *hits,
            })
            .collect()
    }

    fn delete_artifact(&self, name: &str) -> bool {
        self.artifacts.write().remove(name).is_some()
    }

    fn clear_scope(&self, scope: StoreScope) -> bool {
        match scope {
            StoreScope::Cache => self.entries.write().clear(),
            StoreScope::Compiled => self.artifacts.write().clear(),
        }
        true
    }
}

// == Lazy Iterator ==
struct MemoryIter<'a> {
    store: &'a MemoryStore,
    items: std::vec::IntoIter<(String, u64)>,
    fields: IterFields,
}

impl Iterator for MemoryIter<'_> {
    type Item = RawEntry;

    fn next(&mut self) -> Option<RawEntry> {
        for (key, hits) in self.items.by_ref() {
            let value = if self.fields.value {
                match self.store.entries.read().map.get(&key) {
                    Some(entry) => Some(entry.value.clone()),
                    // Removed since the snapshot was taken
                    None => continue,
                }
            } else {
                None
            };

            return Some(RawEntry {
                key,
                value,
                hits: self.fields.hits.then_some(hits),
            });
        }
        None
    }
}
