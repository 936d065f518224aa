#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod error;
pub mod store;

#[doc(inline)]
pub use crate::store::{RedisCounters, RedisCountersBuilder};
