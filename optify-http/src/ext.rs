//! Request and response extensions understood by the middleware.

use std::net::IpAddr;

/// Response extension marking a prebuilt response.
///
/// Handlers (or earlier layers) attach this to responses that must reach the
/// client exactly as built. The middleware skips minification, compression
/// and CORS decoration for them, but still memoizes them when caching is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalized;

/// Request extension carrying the client address for rate limiting.
///
/// Set this from whatever the deployment trusts: the socket peer address, a
/// proxy header, an auth token. Without it the middleware falls back to the
/// connection info or the `x-forwarded-for` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub IpAddr);

/// Request extension listing the methods a route accepts.
///
/// Used to populate `Access-Control-Allow-Methods`; routes that do not attach
/// it get the permissive default set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedMethods(pub Vec<http::Method>);

impl AllowedMethods {
    /// Comma-separated header rendering, e.g. `"GET, POST"`.
    pub fn to_header_value(&self) -> String {
        let methods: Vec<&str> = self.0.iter().map(http::Method::as_str).collect();
        methods.join(", ")
    }
}
