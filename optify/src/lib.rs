#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod counter;
pub mod error;
pub mod limiter;
pub mod value;

pub use cache::MemoryCache;
pub use config::{CacheDirective, OptimizeConfig, ProfileConfig, RateLimitSpec, RedirectSpec};
pub use counter::{CounterStore, MemoryCounters};
pub use error::{ConfigError, StoreError, StoreResult};
pub use limiter::{RateLimiter, Verdict};
pub use value::CacheValue;
