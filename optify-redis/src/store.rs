//! Redis counter store implementation.

use std::time::Duration;

use async_trait::async_trait;
use optify::{CounterStore, StoreError, StoreResult};
use redis::{aio::ConnectionManager, Client};
use tokio::sync::OnceCell;
use tracing::trace;

use crate::error::Error;

/// Redis-backed counter store based on the redis-rs crate.
///
/// Counters live under a configurable key prefix so several deployments can
/// share one Redis instance. The connection is established lazily on first
/// use through a [`ConnectionManager`].
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisCounters {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    key_prefix: String,
}

impl RedisCounters {
    /// Creates a store with default settings (`redis://127.0.0.1/`).
    pub fn new() -> Result<Self, Error> {
        Self::builder().build()
    }

    /// Creates a new builder with default settings.
    #[must_use]
    pub fn builder() -> RedisCountersBuilder {
        RedisCountersBuilder::default()
    }

    /// Lazy connection via [`ConnectionManager`].
    ///
    /// [`ConnectionManager`]: redis::aio::ConnectionManager
    async fn connection(&self) -> Result<&ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("initialize redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager)
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }
}

/// Builder for [`RedisCounters`].
pub struct RedisCountersBuilder {
    connection_info: String,
    key_prefix: String,
}

impl Default for RedisCountersBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            key_prefix: "optify".to_owned(),
        }
    }
}

impl RedisCountersBuilder {
    /// Sets connection info (host, port, database, etc.).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Sets the key prefix counters are stored under.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Creates the store with the configured settings.
    pub fn build(self) -> Result<RedisCounters, Error> {
        Ok(RedisCounters {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            key_prefix: self.key_prefix,
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounters {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
        let mut con = self.connection().await?.clone();
        let value: Option<i64> = redis::cmd("GET")
            .arg(self.storage_key(key))
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(value)
    }

    async fn incr(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut con = self.connection().await?.clone();
        let value: i64 = redis::cmd("INCRBY")
            .arg(self.storage_key(key))
            .arg(delta)
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(value)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let mut con = self.connection().await?.clone();
        // EXPIRE has whole-second resolution; round sub-second TTLs up.
        let seconds = ttl.as_secs().max(1);
        redis::cmd("EXPIRE")
            .arg(self.storage_key(key))
            .arg(seconds)
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut con = self.connection().await?.clone();
        redis::cmd("DEL")
            .arg(self.storage_key(key))
            .query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_carry_the_configured_prefix() {
        let store = RedisCounters::builder()
            .key_prefix("limits")
            .build()
            .unwrap();
        assert_eq!(store.storage_key("1.2.3.4"), "limits:1.2.3.4");
        assert_eq!(store.storage_key("ban:1.2.3.4"), "limits:ban:1.2.3.4");
    }

    #[test]
    fn invalid_connection_info_fails_at_build_time() {
        assert!(RedisCounters::builder()
            .server("not-a-valid-url")
            .build()
            .is_err());
    }
}
