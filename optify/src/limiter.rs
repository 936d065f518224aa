//! Fixed-window rate limiting with temporary bans.
//!
//! Requests are counted per client in a window of `window_secs`; once the
//! count passes `max_requests` the client is rejected and, when bans are
//! enabled, a ban marker is stored for `ban_secs`. Requests that arrive while
//! banned refresh the ban, so a client only recovers after a full quiet ban
//! period. The quota decision is made on the value the store's atomic
//! increment returns, never on a separate read, so concurrent requests from
//! one client cannot slip past the quota. Store failures never reject
//! traffic: the limiter fails open and logs the error.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::config::RateLimitSpec;
use crate::counter::CounterStore;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Under quota; the request was recorded.
    Allowed,
    /// Quota reached in the current window.
    Exceeded,
    /// A previous overflow banned this client and the ban is still active.
    Banned,
}

impl Verdict {
    /// Whether the request may proceed to the handler.
    pub fn is_allowed(self) -> bool {
        matches!(self, Verdict::Allowed)
    }
}

/// Fixed-window limiter over a pluggable counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Creates a limiter backed by the given counter store.
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        RateLimiter { store }
    }

    fn ban_key(client: &str) -> String {
        format!("ban:{client}")
    }

    /// Checks the client against the quota and records the request.
    ///
    /// Any store error is logged and treated as [`Verdict::Allowed`].
    pub async fn check_and_record(&self, client: &str, spec: &RateLimitSpec) -> Verdict {
        if spec.ban_secs > 0 {
            match self.store.get(&Self::ban_key(client)).await {
                Ok(Some(_)) => {
                    // Still hammering while banned: push the ban out again.
                    self.ban(client, spec).await;
                    return Verdict::Banned;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(client, error = %err, "ban read failed, allowing request");
                    return Verdict::Allowed;
                }
            }
        }

        // Increment first, decide on the returned value. A read-then-write
        // pair would let concurrent requests both observe under-quota.
        let count = match self.store.incr(client, 1).await {
            Ok(count) => count,
            Err(err) => {
                warn!(client, error = %err, "counter update failed, allowing request");
                return Verdict::Allowed;
            }
        };
        if count > spec.max_requests {
            if spec.ban_secs > 0 {
                self.ban(client, spec).await;
            }
            return Verdict::Exceeded;
        }

        // First hit of a window starts its expiry clock.
        if count == 1
            && let Err(err) = self
                .store
                .expire(client, Duration::from_secs(spec.window_secs))
                .await
        {
            warn!(client, error = %err, "window expiry failed, allowing request");
        }
        Verdict::Allowed
    }

    async fn ban(&self, client: &str, spec: &RateLimitSpec) {
        let key = Self::ban_key(client);
        let expiry = async {
            self.store.incr(&key, 1).await?;
            self.store.expire(&key, Duration::from_secs(spec.ban_secs)).await
        };
        if let Err(err) = expiry.await {
            warn!(client, error = %err, "ban write failed");
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::counter::MemoryCounters;
    use crate::error::{StoreError, StoreResult};

    fn spec(max: i64, window: u64, ban: u64) -> RateLimitSpec {
        RateLimitSpec {
            max_requests: max,
            window_secs: window,
            ban_secs: ban,
        }
    }

    fn limiter() -> (RateLimiter, Arc<MemoryCounters>) {
        let store = Arc::new(MemoryCounters::new());
        (RateLimiter::new(store.clone()), store)
    }

    #[tokio::test]
    async fn quota_then_rejection() {
        let (limiter, _) = limiter();
        let spec = spec(3, 60, 0);
        for _ in 0..3 {
            assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Allowed);
        }
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Exceeded);
        // Another client is unaffected.
        assert_eq!(limiter.check_and_record("5.6.7.8", &spec).await, Verdict::Allowed);
    }

    #[tokio::test]
    async fn ban_outlives_the_counting_window() {
        let (limiter, store) = limiter();
        let spec = spec(1, 60, 84600);
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Allowed);
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Exceeded);
        // Window rolls over, but the ban marker keeps the client out.
        store.force_expire("1.2.3.4");
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Banned);
    }

    #[tokio::test]
    async fn ban_lifts_after_expiry() {
        let (limiter, store) = limiter();
        let spec = spec(1, 60, 84600);
        limiter.check_and_record("1.2.3.4", &spec).await;
        limiter.check_and_record("1.2.3.4", &spec).await;
        store.force_expire("1.2.3.4");
        store.force_expire("ban:1.2.3.4");
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Allowed);
    }

    /// Counter store whose point reads lag behind its increments, the way a
    /// snapshot read races concurrent writers.
    struct StaleReadStore {
        inner: MemoryCounters,
    }

    #[async_trait]
    impl CounterStore for StaleReadStore {
        async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
            if key.starts_with("ban:") {
                self.inner.get(key).await
            } else {
                Ok(Some(0))
            }
        }

        async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64> {
            self.inner.incr(key, delta).await
        }

        async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
            self.inner.expire(key, ttl).await
        }

        async fn delete(&self, key: &str) -> StoreResult<()> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn quota_decision_follows_the_atomic_increment() {
        // A limiter deciding on a separate read would see 0 here every time
        // and over-admit; the verdict must come from the incremented value.
        let limiter = RateLimiter::new(Arc::new(StaleReadStore {
            inner: MemoryCounters::new(),
        }));
        let spec = spec(2, 60, 120);
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Allowed);
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Allowed);
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Exceeded);
        assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Banned);
    }

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<i64>> {
            Err(StoreError::Connection(Box::new(std::io::Error::other(
                "store offline",
            ))))
        }

        async fn incr(&self, _key: &str, _delta: i64) -> StoreResult<i64> {
            Err(StoreError::Connection(Box::new(std::io::Error::other(
                "store offline",
            ))))
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> StoreResult<()> {
            Err(StoreError::Connection(Box::new(std::io::Error::other(
                "store offline",
            ))))
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            Err(StoreError::Connection(Box::new(std::io::Error::other(
                "store offline",
            ))))
        }
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let limiter = RateLimiter::new(Arc::new(BrokenStore));
        let spec = spec(1, 60, 84600);
        for _ in 0..5 {
            assert_eq!(limiter.check_and_record("1.2.3.4", &spec).await, Verdict::Allowed);
        }
    }
}
