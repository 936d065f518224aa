//! Error types for configuration and counter-store interaction.

use thiserror::Error;

/// Invalid middleware configuration detected while resolving a call.
///
/// Raised synchronously at request time and surfaced to the host framework;
/// the pipeline never recovers from it silently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested response profile is not present in the registry.
    #[error("unknown response profile: {0:?}")]
    UnknownProfile(String),
    /// The cache directive has the wrong shape.
    ///
    /// Valid shapes are `false`, a number of seconds, or a string of the form
    /// `"METHOD-seconds"` with methods separated by `|` (e.g. `"GET|HEAD-600"`).
    #[error("cache directive must be false, a number of seconds or \"METHOD-seconds\", got {0}")]
    InvalidCacheDirective(String),
    /// A method token in a scoped cache directive is not a valid HTTP method name.
    #[error("invalid HTTP method {method:?} in cache directive {directive:?}")]
    InvalidMethod {
        /// The offending method token.
        method: String,
        /// The full directive string it came from.
        directive: String,
    },
    /// The seconds suffix of a scoped cache directive is not a number.
    #[error("invalid cache period in directive {0:?}")]
    InvalidPeriod(String),
}

/// Error groups for counter-store interaction.
///
/// The rate limiter treats any store error as "limiting disabled for this
/// request" (fail-open), so these errors never abort a request on their own.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not bound to network interaction.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send>),
    /// Network interaction error.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send>),
}

/// Result alias for counter-store operations.
pub type StoreResult<T> = Result<T, StoreError>;
