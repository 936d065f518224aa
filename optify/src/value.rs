//! Cached value with expiration metadata.
//!
//! A [`CacheValue`] wraps arbitrary data with the timestamp past which it must
//! be treated as absent. Expiry is evaluated lazily on read; nothing sweeps
//! expired values in the background.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A cached value paired with its expiry timestamp.
///
/// The invariant callers rely on: a value is only ever returned while
/// `now < expires_at`. After that it is treated as absent and eventually
/// overwritten by the next write to the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheValue<T> {
    data: T,
    expires_at: DateTime<Utc>,
}

impl<T> CacheValue<T> {
    /// Creates a value expiring `ttl` from now.
    pub fn new(data: T, ttl: Duration) -> Self {
        CacheValue {
            data,
            expires_at: expiry_from_now(ttl),
        }
    }

    /// Creates a value with an explicit expiry timestamp.
    pub fn with_expiry(data: T, expires_at: DateTime<Utc>) -> Self {
        CacheValue { data, expires_at }
    }

    /// Returns a reference to the cached data.
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns the expiry timestamp.
    #[inline]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the value is still valid at this instant.
    pub fn is_live(&self) -> bool {
        Utc::now() < self.expires_at
    }

    /// Consumes the value and returns the inner data, discarding the expiry.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Remaining time-to-live, or `None` once expired.
    pub fn ttl(&self) -> Option<Duration> {
        let remaining = self.expires_at.signed_duration_since(Utc::now());
        if remaining.num_milliseconds() > 0 {
            Some(Duration::from_millis(remaining.num_milliseconds() as u64))
        } else {
            None
        }
    }
}

/// Saturating `now + ttl` conversion between std and chrono durations.
pub(crate) fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    let delta = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    Utc::now()
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
