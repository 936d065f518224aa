//! Error types for the Redis counter store.

use optify::StoreError;
use redis::RedisError;

/// Error type for Redis counter operations.
///
/// Wraps errors from the underlying [`redis`] crate; converted to
/// [`StoreError`] before they reach the rate limiter, which fails open on
/// them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("Redis counter store error: {0}")]
    Redis(#[from] RedisError),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        Self::Internal(Box::new(error))
    }
}
