//! Envelope Cache Module
//!
//! Main cache engine: wraps values in envelopes on top of a `RawStore` and
//! applies TTL, popularity and pattern policies.

use std::sync::Arc;

use parking_lot::Mutex;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cache::envelope::{self, Envelope};
use crate::cache::{CacheStats, Gauge, KeyLocks, Scope, Search, TtlMode, UpdateRequest, Value};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::raw::{IterFields, RawStore, StoreScope};

// == Envelope Cache ==
/// TTL-aware, type-preserving cache over an injected raw store.
///
/// `fetch` does not evaluate logical expiry unless
/// `Config::enforce_expiry_on_fetch` is set; removal of expired entries is
/// left to the raw store's native TTL and to `sweep_expired`.
pub struct EnvelopeCache<S: RawStore> {
    /// Underlying key-value engine
    store: S,
    /// Shared time source
    clock: Arc<dyn Clock>,
    /// Per-key locks for read-modify-write sequences
    locks: KeyLocks,
    /// Activity counters
    stats: Mutex<CacheStats>,
    config: Config,
}

impl<S: RawStore> EnvelopeCache<S> {
    // == Constructor ==
    /// Creates a cache over `store` with default configuration.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(store, clock, &Config::default())
    }

    /// Creates a cache over `store` with the given configuration.
    pub fn with_config(store: S, clock: Arc<dyn Clock>, config: &Config) -> Self {
        debug!(
            "Initializing envelope cache: enforce_expiry_on_fetch={}, lock_stripes={}",
            config.enforce_expiry_on_fetch, config.lock_stripes
        );
        Self {
            store,
            clock,
            locks: KeyLocks::new(config.lock_stripes),
            stats: Mutex::new(CacheStats::new()),
            config: config.clone(),
        }
    }

    /// Returns the underlying raw store.
    pub fn raw(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Exists ==
    /// Checks raw existence. Logical expiry is not evaluated.
    pub fn exists(&self, key: &str) -> bool {
        self.store.exists(key)
    }

    // == Fetch ==
    /// Retrieves a value with its original shape.
    ///
    /// Returns `Ok(None)` if the key is absent. Corrupt envelopes surface as
    /// `CacheError::Encoding`.
    pub fn fetch(&self, key: &str) -> Result<Option<Value>> {
        debug!("FETCH key={}", key);

        let Some(envelope) = self.read_envelope(key)? else {
            self.stats.lock().record_miss();
            return Ok(None);
        };

        if self.config.enforce_expiry_on_fetch && envelope.is_expired(self.clock.now()) {
            debug!("Key logically expired: {}", key);
            self.stats.lock().record_miss();
            return Ok(None);
        }

        self.stats.lock().record_hit();
        Ok(Some(envelope.data))
    }

    // == Store ==
    /// Stores a value with an optional TTL in seconds (0 = no expiry).
    ///
    /// With `overwrite = false` this is insert-if-absent: an existing key is
    /// left untouched and `CacheError::OverwriteRefused` is returned.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl_secs` - TTL in seconds, 0 for none
    /// * `overwrite` - Whether an existing entry may be replaced
    pub fn store(
        &self,
        key: &str,
        value: impl Into<Value>,
        ttl_secs: u64,
        overwrite: bool,
    ) -> Result<()> {
        self.validate_key(key)?;
        let value = value.into();
        let expires_at = self.deadline_for(ttl_secs)?;

        let _guard = self.locks.lock(key);
        if !overwrite && self.store.exists(key) {
            debug!("STORE refused, key exists: {}", key);
            self.stats.lock().record_refusal();
            return Err(CacheError::OverwriteRefused(key.to_string()));
        }

        debug!("STORE key={}, ttl={}, tag={}", key, ttl_secs, value.type_tag());
        self.write_envelope(key, &value, expires_at, ttl_secs)?;
        self.stats.lock().record_store();
        Ok(())
    }

    // == Delete ==
    /// Removes an entry. Returns false if the key was absent.
    pub fn delete(&self, key: &str) -> bool {
        debug!("DELETE key={}", key);

        let _guard = self.locks.lock(key);
        if !self.store.exists(key) {
            return false;
        }
        self.store.delete(key)
    }

    // == Update ==
    /// Replaces data or applies a numeric delta, keeping the original deadline.
    ///
    /// Returns the new value, or `Ok(None)` if the key is absent. A delta
    /// against non-numeric data fails with `CacheError::TypeMismatch`.
    pub fn update(&self, key: &str, request: UpdateRequest) -> Result<Option<Value>> {
        let _guard = self.locks.lock(key);

        let Some(envelope) = self.read_envelope(key)? else {
            debug!("UPDATE on missing key: {}", key);
            return Ok(None);
        };

        let data = match request {
            UpdateRequest::Replace(value) => value,
            UpdateRequest::Delta(delta) => apply_delta(key, &envelope.data, delta)?,
        };

        let ttl_secs = self.remaining_ttl_secs(envelope.expires_at);
        debug!(
            "UPDATE key={}, expires_at={}, remaining={}s",
            key, envelope.expires_at, ttl_secs
        );
        self.write_envelope(key, &data, envelope.expires_at, ttl_secs)?;
        self.stats.lock().record_update();
        Ok(Some(data))
    }

    /// Adds `n` to a numeric entry.
    pub fn inc(&self, key: &str, n: i64) -> Result<Option<Value>> {
        self.update(key, UpdateRequest::Delta(n))
    }

    /// Subtracts `n` from a numeric entry.
    pub fn dec(&self, key: &str, n: i64) -> Result<Option<Value>> {
        let delta = n
            .checked_neg()
            .ok_or_else(|| CacheError::InvalidRequest(format!("cannot negate {}", n)))?;
        self.update(key, UpdateRequest::Delta(delta))
    }

    // == Time To Live ==
    /// Reports an entry's deadline.
    ///
    /// # Returns
    /// - `None` if the key is absent
    /// - `Some(0)` if the entry never expires
    /// - `Some(expires_at - now)` in `TtlMode::Remaining`, negative once passed
    /// - `Some(expires_at)` in `TtlMode::Absolute`
    pub fn ttl(&self, key: &str, mode: TtlMode) -> Result<Option<i64>> {
        let Some(envelope) = self.read_envelope(key)? else {
            return Ok(None);
        };

        if envelope.expires_at == 0 {
            return Ok(Some(0));
        }

        Ok(Some(match mode {
            TtlMode::Absolute => envelope.expires_at,
            TtlMode::Remaining => envelope.expires_at - self.clock.now(),
        }))
    }

    // == Search ==
    /// Lazily walks entries whose key matches the regular expression `pattern`.
    ///
    /// Without values each item is `(key, Value::Str(key))`.
    pub fn search(&self, pattern: &str, include_values: bool) -> Result<Search<'_>> {
        let regex = Regex::new(pattern)?;
        let fields = if include_values {
            IterFields::WITH_VALUES
        } else {
            IterFields::KEYS
        };
        debug!("SEARCH pattern={}, values={}", pattern, include_values);
        Ok(Search::new(
            self.store.iterate(Some(&regex), fields),
            include_values,
        ))
    }

    // == Delete Matching ==
    /// Deletes every entry whose key matches `pattern`, regardless of TTL state.
    ///
    /// Keys come from the raw per-entry stats rather than the raw iterator,
    /// so entries whose native TTL has lapsed but which are not yet swept
    /// are removed too. Returns the number of entries actually removed.
    pub fn delete_matching(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        let keys: Vec<String> = self
            .store
            .entry_stats()
            .into_iter()
            .map(|stat| stat.key)
            .filter(|key| regex.is_match(key))
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }

        let removed = self.store.delete_batch(&keys);
        if removed < keys.len() {
            warn!(
                "Pattern delete removed {} of {} matching keys",
                removed,
                keys.len()
            );
        }
        info!("Pattern delete: removed {} entries matching {}", removed, pattern);
        self.stats.lock().record_pattern_deleted(removed);
        Ok(removed)
    }

    // == Sweep Expired ==
    /// Removes every entry whose raw creation time plus raw TTL has passed.
    ///
    /// Works from the raw store's per-entry stats, which include entries its
    /// own iterator already hides. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .store
            .entry_stats()
            .into_iter()
            .filter(|stat| {
                stat.ttl_secs != 0
                    && stat
                        .created_at
                        .saturating_add(i64::try_from(stat.ttl_secs).unwrap_or(i64::MAX))
                        < now
            })
            .map(|stat| stat.key)
            .collect();

        let removed = self.delete_each(&expired);
        if removed > 0 {
            info!("Expiration sweep: removed {} entries", removed);
        } else {
            debug!("Expiration sweep: no expired entries found");
        }
        self.stats.lock().record_swept(removed);
        removed
    }

    // == Purge ==
    /// Removes entries whose hit count is at most `min_hits`.
    ///
    /// Only live entries are considered in the cache scope; lapsed entries
    /// are left for the sweep.
    pub fn purge(&self, scope: Scope, min_hits: u64) -> usize {
        let removed: usize = scope
            .store_scopes()
            .iter()
            .map(|store_scope| match store_scope {
                StoreScope::Cache => self.purge_entries(min_hits),
                StoreScope::Compiled => self.purge_artifacts(min_hits),
            })
            .sum();

        info!(
            "Purge {:?}: removed {} entries with hits <= {}",
            scope, removed, min_hits
        );
        self.stats.lock().record_purged(removed);
        removed
    }

    /// Purges with the configured `purge_min_hits` threshold.
    pub fn purge_unpopular(&self, scope: Scope) -> usize {
        self.purge(scope, self.config.purge_min_hits)
    }

    fn purge_entries(&self, min_hits: u64) -> usize {
        let victims: Vec<String> = self
            .store
            .iterate(None, IterFields::WITH_HITS)
            .filter(|entry| entry.hits.unwrap_or(0) <= min_hits)
            .map(|entry| entry.key)
            .collect();
        self.delete_each(&victims)
    }

    fn purge_artifacts(&self, min_hits: u64) -> usize {
        self.store
            .artifact_stats()
            .into_iter()
            .filter(|artifact| artifact.hits <= min_hits)
            .filter(|artifact| {
                let deleted = self.store.delete_artifact(&artifact.name);
                if !deleted {
                    warn!("Failed to delete artifact {}", artifact.name);
                }
                deleted
            })
            .count()
    }

    // == Flush ==
    /// Clears a scope entirely. `Scope::All` succeeds only if both clears do.
    pub fn flush(&self, scope: Scope) -> bool {
        let mut ok = true;
        for store_scope in scope.store_scopes() {
            if !self.store.clear_scope(*store_scope) {
                warn!("Failed to clear {:?} scope", store_scope);
                ok = false;
            }
        }
        info!("Flush {:?}: success={}", scope, ok);
        ok
    }

    // == Free Memory ==
    /// Percentage of raw store memory still available, to one decimal place.
    pub fn free_memory_percent(&self) -> f64 {
        let segments = self.store.segment_stats();
        let total = segments.segment_count.saturating_mul(segments.segment_size);
        if total == 0 {
            return 0.0;
        }
        let percent = segments.available_bytes as f64 / total as f64 * 100.0;
        (percent * 10.0).round() / 10.0
    }

    // == Gauges ==
    /// Point-in-time store gauges alongside the activity counters.
    pub fn gauge(&self) -> Gauge {
        let segments = self.store.segment_stats();
        Gauge {
            live_entries: self.store.iterate(None, IterFields::KEYS).count(),
            tracked_entries: self.store.entry_stats().len(),
            available_bytes: segments.available_bytes,
            free_memory_percent: self.free_memory_percent(),
        }
    }

    // == Stats ==
    /// Returns a snapshot of the activity counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    // == Internals ==
    fn validate_key(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("Key must not be empty".to_string()));
        }
        if key.len() > self.config.max_key_length {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                self.config.max_key_length
            )));
        }
        Ok(())
    }

    fn deadline_for(&self, ttl_secs: u64) -> Result<i64> {
        if ttl_secs == 0 {
            return Ok(0);
        }
        i64::try_from(ttl_secs)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add(ttl))
            .ok_or_else(|| CacheError::InvalidRequest(format!("TTL {} is out of range", ttl_secs)))
    }

    /// Raw TTL that lands on `expires_at`; never 0 for a dated entry.
    fn remaining_ttl_secs(&self, expires_at: i64) -> u64 {
        if expires_at == 0 {
            return 0;
        }
        (expires_at - self.clock.now()).max(1) as u64
    }

    fn read_envelope(&self, key: &str) -> Result<Option<Envelope>> {
        let Some(bytes) = self.store.get_raw(key) else {
            return Ok(None);
        };
        envelope::decode_keyed(key, &bytes).map(Some).map_err(|err| {
            warn!("Corrupt envelope for key {}: {}", key, err);
            err
        })
    }

    fn write_envelope(&self, key: &str, data: &Value, expires_at: i64, ttl_secs: u64) -> Result<()> {
        let bytes = envelope::encode(data, expires_at)?;
        if bytes.len() > self.config.max_value_size {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                self.config.max_value_size
            )));
        }

        if self.store.set_raw(key, bytes, ttl_secs) {
            Ok(())
        } else {
            warn!("Raw store rejected write for key {}", key);
            Err(CacheError::StoreRejected(key.to_string()))
        }
    }

    /// Deletes keys one by one, counting successes and carrying on past failures.
    fn delete_each(&self, keys: &[String]) -> usize {
        keys.iter()
            .filter(|key| {
                let deleted = self.store.delete(key);
                if !deleted {
                    debug!("Key vanished before delete: {}", key);
                }
                deleted
            })
            .count()
    }
}

// == Delta Arithmetic ==
fn apply_delta(key: &str, current: &Value, delta: i64) -> Result<Value> {
    match current {
        Value::Int(n) => n.checked_add(delta).map(Value::Int).ok_or_else(|| {
            CacheError::InvalidRequest(format!("Delta {} overflows value of {}", delta, key))
        }),
        // A finite float plus any i64 stays finite
        Value::Float(f) => Ok(Value::Float(f + delta as f64)),
        _ => Err(CacheError::TypeMismatch {
            key: key.to_string(),
            expected: "numeric data",
        }),
    }
}
