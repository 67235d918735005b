//! Memory Store Module
//!
//! The map behind the memory backend, guarded by a single reader/writer lock.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::{CacheEntry, StatsRecorder};
use crate::error::{CacheError, Result};

// == Memory Store ==
/// Key-value storage shared between a [`MemoryCache`](crate::cache::MemoryCache)
/// and its sweep task.
///
/// Reads take the shared side of the lock, every mutation the exclusive side.
#[derive(Debug)]
pub struct MemoryStore<V> {
    /// Key-value storage
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    /// Operation counters
    stats: StatsRecorder,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: StatsRecorder::new(),
        }
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry and its expiration.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Resolved time to live (never zero here)
    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, ttl);
        self.entries.write().insert(key.to_string(), entry);
        self.stats.record_write();
    }

    // == Get ==
    /// Returns a clone of the value if a live entry exists.
    ///
    /// Expired entries are left in place for the sweeper; reading never mutates the map.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let value = self
            .entries
            .read()
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone());

        self.stats.record_lookup(value.is_some());
        value
    }

    // == Contains Live ==
    /// Returns true if a live entry exists for `key`.
    pub fn contains_live(&self, key: &str) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.is_live())
    }

    // == Delete ==
    /// Removes the entry stored under `key`, live or not.
    pub fn delete(&self, key: &str) -> Result<()> {
        if self.entries.write().remove(key).is_some() {
            self.stats.record_delete();
            Ok(())
        } else {
            Err(CacheError::NotFound(key.to_string()))
        }
    }

    // == Clear ==
    /// Swaps the map for an empty one in a single critical section.
    pub fn clear(&self) -> usize {
        let old = std::mem::take(&mut *self.entries.write());
        old.len()
    }

    // == Expired Keys ==
    /// Collects the keys whose entries are no longer live, under the read lock only.
    pub fn expired_keys(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Sweep Expired ==
    /// Removes expired entries in two phases: scan under the read lock, then
    /// remove under one write lock.
    ///
    /// A key re-added with a fresh expiration between the phases is kept.
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let candidates = self.expired_keys();
        if candidates.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for key in candidates {
            if entries.get(&key).is_some_and(|entry| entry.is_expired()) {
                entries.remove(&key);
                removed += 1;
            }
        }
        drop(entries);

        self.stats.record_evictions(removed);
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    // == Length ==
    /// Returns the number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
