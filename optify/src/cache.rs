//! In-memory response cache keyed by request URL.
//!
//! The cache is a concurrent map from key to [`CacheValue`]. Reads return only
//! live values; expired entries are not removed on read, they are simply
//! superseded by the next write to the same key. Unbounded growth is an
//! accepted tradeoff for this middleware (entries are bounded by the number of
//! distinct cache-enabled URLs an application serves).

use std::time::Duration;

use dashmap::DashMap;

use crate::value::CacheValue;

/// Concurrent map from cache key to a stored value with expiry.
///
/// Cloning is cheap; clones share the same underlying map. Safe for use from
/// multiple request-handling threads without external locking.
#[derive(Debug, Default)]
pub struct MemoryCache<T> {
    entries: DashMap<String, CacheValue<T>>,
}

impl<T: Clone> MemoryCache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        MemoryCache {
            entries: DashMap::new(),
        }
    }

    /// Returns the stored value for `key` while its expiry is in the future.
    ///
    /// An expired entry behaves exactly like a missing one.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|value| value.is_live())
            .map(|value| value.data().clone())
    }

    /// Stores `data` under `key`, expiring `ttl` from now.
    ///
    /// Overwrites any previous entry for the key, live or stale.
    pub fn put(&self, key: impl Into<String>, data: T, ttl: Duration) {
        self.entries.insert(key.into(), CacheValue::new(data, ttl));
    }

    /// Number of entries currently held, including stale ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn force_expire(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            let data = entry.data().clone();
            *entry = CacheValue::with_expiry(data, chrono::Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_live_entries() {
        let cache = MemoryCache::new();
        cache.put("http://h/a", "body".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("http://h/a"), Some("body".to_string()));
        assert_eq!(cache.get("http://h/b"), None);
    }

    #[test]
    fn expired_entry_reads_as_absent() {
        let cache = MemoryCache::new();
        cache.put("k", 1u32, Duration::from_secs(60));
        cache.force_expire("k");
        assert_eq!(cache.get("k"), None);
        // The stale entry stays in the map until superseded.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_supersedes_stale_entry() {
        let cache = MemoryCache::new();
        cache.put("k", 1u32, Duration::from_secs(60));
        cache.force_expire("k");
        cache.put("k", 2u32, Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
