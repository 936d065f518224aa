//! Profile registry and middleware configuration.
//!
//! Configuration is built once at application startup, validated explicitly,
//! and injected into the middleware; there is no global mutable state. Each
//! response profile (`html`, `json`, `text`, …) bundles the minify/compress
//! defaults and a cache directive; per-route overrides applied at decoration
//! time take precedence over the profile values.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Polymorphic cache setting for a profile or a per-route override.
///
/// Mirrors the accepted configuration shapes:
///
/// - `false` (or `0` seconds) disables caching,
/// - an integer caches every method for that many seconds,
/// - a string `"METHOD-seconds"` caches only the listed methods, with `|`
///   separating method names (e.g. `"GET|HEAD-600"`).
///
/// `true` and malformed strings are configuration errors, reported when the
/// directive is resolved, never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheDirective {
    /// `false` disables caching; `true` is rejected as malformed.
    Flag(bool),
    /// Cache every method for this many seconds; zero disables.
    Seconds(u64),
    /// `"METHOD-seconds"` string, resolved against the request method.
    Scoped(String),
}

impl CacheDirective {
    /// Directive that disables caching.
    pub fn disabled() -> Self {
        CacheDirective::Flag(false)
    }

    /// Resolves the directive against a request method.
    ///
    /// Returns the cache period for this call, `None` when caching is
    /// disabled for the method, or a [`ConfigError`] for malformed input.
    pub fn resolve(&self, method: &str) -> Result<Option<Duration>, ConfigError> {
        match self {
            CacheDirective::Flag(false) => Ok(None),
            CacheDirective::Flag(true) => Err(ConfigError::InvalidCacheDirective(
                "true".to_string(),
            )),
            CacheDirective::Seconds(0) => Ok(None),
            CacheDirective::Seconds(seconds) => Ok(Some(Duration::from_secs(*seconds))),
            CacheDirective::Scoped(spec) => {
                let (methods, period) = spec
                    .rsplit_once('-')
                    .ok_or_else(|| ConfigError::InvalidCacheDirective(format!("{spec:?}")))?;
                let seconds: u64 = period
                    .parse()
                    .map_err(|_| ConfigError::InvalidPeriod(spec.clone()))?;
                let mut matched = false;
                for token in methods.split('|') {
                    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_uppercase()) {
                        return Err(ConfigError::InvalidMethod {
                            method: token.to_string(),
                            directive: spec.clone(),
                        });
                    }
                    matched |= token == method;
                }
                if matched && seconds > 0 {
                    Ok(Some(Duration::from_secs(seconds)))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

impl From<bool> for CacheDirective {
    fn from(flag: bool) -> Self {
        CacheDirective::Flag(flag)
    }
}

impl From<u64> for CacheDirective {
    fn from(seconds: u64) -> Self {
        CacheDirective::Seconds(seconds)
    }
}

impl From<&str> for CacheDirective {
    fn from(spec: &str) -> Self {
        CacheDirective::Scoped(spec.to_string())
    }
}

/// Per-profile transformation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Minify HTML bodies.
    pub minify: bool,
    /// Gzip-compress bodies.
    pub compress: bool,
    /// Cache directive for responses produced under this profile.
    pub cache: CacheDirective,
}

/// Fixed-window rate-limit settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSpec {
    /// Requests allowed per window per client.
    pub max_requests: i64,
    /// Counting window length in seconds.
    pub window_secs: u64,
    /// Ban length in seconds once the quota is exceeded; zero disables bans.
    pub ban_secs: u64,
}

/// Host substitution applied before the handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectSpec {
    /// Hosts that trigger the redirect when found in the request URL.
    pub source_hosts: Vec<String>,
    /// Replacement host.
    pub target_host: String,
}

/// Complete middleware configuration.
///
/// The default registry reproduces the conventional profiles: `html` is
/// minified, compressed and cached for GETs; `json` is compressed only;
/// `text` is compressed and cached for GETs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    /// Response profiles keyed by name.
    pub profiles: HashMap<String, ProfileConfig>,
    /// Global rate-limit settings; `None` disables limiting.
    pub limit: Option<RateLimitSpec>,
    /// Host redirect settings; `None` disables redirects.
    pub redirect_hosts: Option<RedirectSpec>,
    /// Where to send rate-limited clients instead of a 429 response.
    pub exceeded_redirect: Option<String>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            "html".to_string(),
            ProfileConfig {
                minify: true,
                compress: true,
                cache: CacheDirective::from("GET-84600"),
            },
        );
        profiles.insert(
            "json".to_string(),
            ProfileConfig {
                minify: false,
                compress: true,
                cache: CacheDirective::disabled(),
            },
        );
        profiles.insert(
            "text".to_string(),
            ProfileConfig {
                minify: false,
                compress: true,
                cache: CacheDirective::from("GET-84600"),
            },
        );
        OptimizeConfig {
            profiles,
            limit: None,
            redirect_hosts: None,
            exceeded_redirect: None,
        }
    }
}

impl OptimizeConfig {
    /// Looks up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&ProfileConfig, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}
