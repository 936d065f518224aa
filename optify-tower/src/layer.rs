use std::sync::Arc;

use optify::{
    CacheDirective, CounterStore, MemoryCache, MemoryCounters, OptimizeConfig, RateLimiter,
};
use optify_http::{AllowedMethods, StoredResponse};
use tower::Layer;

use crate::service::OptimizeService;

/// State shared by every layer built from one [`Optimizer`].
pub(crate) struct Shared {
    pub(crate) config: OptimizeConfig,
    pub(crate) cache: MemoryCache<StoredResponse>,
    pub(crate) limiter: Option<RateLimiter>,
}

/// Shared middleware state: profile registry, response cache and limiter.
///
/// Build one `Optimizer` at startup and derive per-route layers from it; the
/// cache and the rate-limit counters are shared across all of them.
#[derive(Clone)]
pub struct Optimizer {
    shared: Arc<Shared>,
}

impl Optimizer {
    /// Creates an optimizer with in-memory rate-limit counters.
    pub fn new(config: OptimizeConfig) -> Self {
        let limiter = config
            .limit
            .is_some()
            .then(|| RateLimiter::new(Arc::new(MemoryCounters::new())));
        Optimizer {
            shared: Arc::new(Shared {
                config,
                cache: MemoryCache::new(),
                limiter,
            }),
        }
    }

    /// Creates an optimizer with an external counter store, e.g. Redis.
    pub fn with_counters(config: OptimizeConfig, store: Arc<dyn CounterStore>) -> Self {
        Optimizer {
            shared: Arc::new(Shared {
                config,
                cache: MemoryCache::new(),
                limiter: Some(RateLimiter::new(store)),
            }),
        }
    }

    /// Builds a layer for the named response profile.
    pub fn layer(&self, profile: &str) -> Optimize {
        Optimize {
            shared: Arc::clone(&self.shared),
            settings: LayerSettings {
                profile: profile.to_string(),
                minify: None,
                compress: None,
                cache: None,
                cors: None,
                limited: true,
                redirects: true,
                allow_methods: None,
            },
        }
    }
}

/// Per-layer settings: the profile name plus any overrides.
#[derive(Clone)]
pub(crate) struct LayerSettings {
    pub(crate) profile: String,
    pub(crate) minify: Option<bool>,
    pub(crate) compress: Option<bool>,
    pub(crate) cache: Option<CacheDirective>,
    pub(crate) cors: Option<bool>,
    pub(crate) limited: bool,
    pub(crate) redirects: bool,
    pub(crate) allow_methods: Option<AllowedMethods>,
}

/// Tower layer applying one response profile, with optional overrides.
#[derive(Clone)]
pub struct Optimize {
    pub(crate) shared: Arc<Shared>,
    pub(crate) settings: LayerSettings,
}

impl Optimize {
    /// Overrides the profile's minify setting.
    pub fn minify(mut self, enabled: bool) -> Self {
        self.settings.minify = Some(enabled);
        self
    }

    /// Overrides the profile's compression setting.
    pub fn compress(mut self, enabled: bool) -> Self {
        self.settings.compress = Some(enabled);
        self
    }

    /// Overrides the profile's cache directive.
    pub fn cache(mut self, directive: impl Into<CacheDirective>) -> Self {
        self.settings.cache = Some(directive.into());
        self
    }

    /// Overrides whether responses get CORS decoration.
    ///
    /// By default only the `json` profile is decorated.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.settings.cors = Some(enabled);
        self
    }

    /// Exempts this layer from rate limiting.
    pub fn unlimited(mut self) -> Self {
        self.settings.limited = false;
        self
    }

    /// Exempts this layer from host redirects.
    pub fn no_redirect(mut self) -> Self {
        self.settings.redirects = false;
        self
    }

    /// Sets the default advertised methods for CORS decoration.
    ///
    /// A per-request [`AllowedMethods`] extension still takes precedence.
    pub fn allow_methods(mut self, methods: Vec<http::Method>) -> Self {
        self.settings.allow_methods = Some(AllowedMethods(methods));
        self
    }
}

impl<S> Layer<S> for Optimize {
    type Service = OptimizeService<S>;

    fn layer(&self, upstream: S) -> Self::Service {
        OptimizeService::new(upstream, Arc::clone(&self.shared), self.settings.clone())
    }
}
