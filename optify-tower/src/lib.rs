//! Tower middleware that post-processes HTTP responses.
//!
//! [`Optimizer`] holds the shared state (profile registry, response cache,
//! optional rate limiter); [`Optimizer::layer`] produces an [`Optimize`]
//! layer for one response profile, with per-layer overrides. The resulting
//! [`service::OptimizeService`] composes like any tower middleware.
//!
//! ```ignore
//! use optify::OptimizeConfig;
//! use optify_tower::Optimizer;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let optimizer = Optimizer::new(OptimizeConfig::default());
//!
//! let service = ServiceBuilder::new()
//!     .layer(optimizer.layer("html"))
//!     .service(service_fn(|_req| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new("<html> … </html>"))
//!     }));
//! ```

#![warn(missing_docs)]

/// Response future for the optimize service.
pub mod future;
/// Tower layer and shared middleware state.
pub mod layer;
/// The Tower service implementation that runs the pipeline.
pub mod service;

pub use ::http::{Method, StatusCode};
pub use layer::{Optimize, Optimizer};
pub use optify::{CacheDirective, OptimizeConfig, ProfileConfig, RateLimitSpec, RedirectSpec};
pub use optify_http::{AllowedMethods, ClientAddr, Finalized};
