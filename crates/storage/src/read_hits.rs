//! Read-hit side table
//!
//! Read-hit counters are observability metadata, not part of a container's
//! identity, so they live beside the index rather than inside containers.
//! Counters are bumped under shared access to the index, hence the
//! concurrent map.

use dashmap::DashMap;
use std::hash::Hash;

/// Per-key read counters
#[derive(Debug)]
pub struct ReadHitTable<K: Eq + Hash> {
    hits: DashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> ReadHitTable<K> {
    /// Create an empty table
    pub fn new() -> Self {
        ReadHitTable {
            hits: DashMap::new(),
        }
    }

    /// Start (or restart) tracking a key at zero
    pub fn reset(&self, key: &K) {
        self.hits.insert(key.clone(), 0);
    }

    /// Increment a key's counter and return the new count
    pub fn record(&self, key: &K) -> u64 {
        let mut entry = self.hits.entry(key.clone()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current count, or None if the key is not tracked
    pub fn get(&self, key: &K) -> Option<u64> {
        self.hits.get(key).map(|v| *v)
    }

    /// Stop tracking a key
    pub fn remove(&self, key: &K) {
        self.hits.remove(key);
    }
}

impl<K: Eq + Hash + Clone> Default for ReadHitTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
