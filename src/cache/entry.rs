//! Cache Entry Module
//!
//! Defines a stored value paired with its absolute expiration time.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cache entry: the value and the instant it stops being live.
///
/// This is also the at-rest record of the file backend, so the field names
/// are part of the persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiration time
    pub expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time to live, already resolved against the backend default
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: expiration_from(Utc::now(), ttl),
        }
    }

    // == Is Live ==
    /// Returns true while the current time is strictly before `expires_at`.
    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    /// Liveness against an explicit clock reading.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    // == Is Expired ==
    pub fn is_expired(&self) -> bool {
        !self.is_live()
    }
}

// == Utility Functions ==
/// Computes `now + ttl`, saturating at the largest representable instant.
pub fn expiration_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Substitutes `default` when the caller passed a zero TTL.
pub fn effective_ttl(ttl: Duration, default: Duration) -> Duration {
    if ttl.is_zero() {
        default
    } else {
        ttl
    }
}
