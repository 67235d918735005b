//! Cache Module
//!
//! The cache contract and its two backends: an in-memory map with a
//! background sweeper, and a sharded directory of content-addressed files.

mod entry;
mod file;
mod layout;
mod memory;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

use crate::error::Result;

// Re-export public types
pub use entry::{effective_ttl, expiration_from, CacheEntry};
pub use file::FileCache;
pub use layout::{key_digest, PathLayout, ShardDepth, DIGEST_HEX_LEN};
pub use memory::{MemoryCache, SweeperHandle};
pub use stats::{CacheStats, StatsRecorder};
pub use store::MemoryStore;

// == Cache Contract ==
/// Operations every backend supports.
///
/// All calls are synchronous and block only on the backend's lock (and, for
/// the file backend, on filesystem I/O). An entry is live while the current
/// time is strictly before its expiration; anything else reads as absent.
pub trait Cache<V>: Send + Sync {
    /// Returns the value of a live entry, or `None` if the key was never set,
    /// was deleted or has expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Stores `value` under `key`, expiring `ttl` from now. A zero `ttl`
    /// uses the backend's default. Any existing entry is replaced.
    fn add(&self, key: &str, value: V, ttl: Duration) -> Result<()>;

    /// Removes the entry for `key`, failing with `NotFound` if there is none.
    fn delete(&self, key: &str) -> Result<()>;

    /// Removes all entries.
    fn flush(&self) -> Result<()>;

    /// True iff a live entry exists for `key`.
    fn exists(&self, key: &str) -> bool;

    /// Begins backend-specific background upkeep.
    fn start_maintenance(&self);

    /// Snapshot of the backend's counters.
    fn stats(&self) -> CacheStats;
}
