//! Key Lock Module
//!
//! Striped mutual exclusion for per-key read-modify-write sequences.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, MutexGuard};

// == Key Locks ==
/// Fixed set of mutexes; each key maps to one stripe by hash.
///
/// Two keys may share a stripe, which only costs contention.
#[derive(Debug)]
pub struct KeyLocks {
    stripes: Box<[Mutex<()>]>,
}

impl KeyLocks {
    /// Creates `stripes` locks (at least one).
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes: (0..stripes.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Blocks until the stripe owning `key` is free.
    pub fn lock(&self, key: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_index(key)].lock()
    }

    fn stripe_index(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }
}
