//! Counter store abstraction for the rate limiter.
//!
//! The limiter only needs four primitives (get, increment, expire, delete),
//! each atomic per key. [`MemoryCounters`] serves single-process deployments;
//! a shared store (see `optify-redis`) serves multi-process ones, using the
//! store's own atomic increment and expiry instead of a local lock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::StoreResult;
use crate::value::expiry_from_now;

/// Atomic per-key counters with optional expiry.
///
/// Semantics follow the usual key-value store conventions: a counter is
/// created on first increment with no expiry, [`expire`](CounterStore::expire)
/// attaches or refreshes one, and an expired counter reads as absent.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<i64>>;

    /// Atomically adds `delta` to the counter, creating it at zero first.
    ///
    /// Returns the value after the increment. Incrementing an expired counter
    /// restarts it from zero.
    async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64>;

    /// Sets the counter to expire `ttl` from now. No-op for missing keys.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()>;

    /// Removes the counter.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

#[derive(Debug, Clone)]
struct Counter {
    value: i64,
    expires_at: Option<DateTime<Utc>>,
}

impl Counter {
    fn is_live(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() < expires_at,
            None => true,
        }
    }
}

/// In-process [`CounterStore`] backed by a concurrent map.
///
/// Per-key atomicity comes from the map's entry locking; expiry is checked
/// lazily on access, never by a background task.
#[derive(Debug, Default)]
pub struct MemoryCounters {
    entries: DashMap<String, Counter>,
}

impl MemoryCounters {
    /// Creates an empty counter store.
    pub fn new() -> Self {
        MemoryCounters {
            entries: DashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn force_expire(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(Utc::now());
        }
    }
}

#[async_trait]
impl CounterStore for MemoryCounters {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .entries
            .get(key)
            .filter(|counter| counter.is_live())
            .map(|counter| counter.value))
    }

    async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut entry = self.entries.entry(key.to_owned()).or_insert(Counter {
            value: 0,
            expires_at: None,
        });
        if !entry.is_live() {
            // Lazy window reset: an expired counter restarts from zero.
            entry.value = 0;
            entry.expires_at = None;
        }
        entry.value += delta;
        Ok(entry.value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.expires_at = Some(expiry_from_now(ttl));
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
