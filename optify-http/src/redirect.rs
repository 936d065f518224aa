//! Host redirects and request URL reconstruction.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use optify::RedirectSpec;
use tracing::debug;

use crate::payload::StoredResponse;

/// Reconstructs the full request URL.
///
/// Absolute-form requests already carry everything. For origin-form requests
/// the scheme comes from `x-forwarded-proto` (falling back to `http`) and the
/// authority from the `Host` header. The result doubles as the memoization
/// cache key.
pub fn request_url<B>(request: &Request<B>) -> String {
    let uri = request.uri();
    if uri.authority().is_some() {
        return uri.to_string();
    }
    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let path = uri
        .path_and_query()
        .map(http::uri::PathAndQuery::as_str)
        .unwrap_or("/");
    format!("{scheme}://{host}{path}")
}

/// Builds a redirect response when the URL matches a source host.
///
/// The first matching source host is substituted with the target host and the
/// client is sent a `302 Found` to the rewritten URL.
pub fn host_redirect(url: &str, spec: &RedirectSpec) -> Option<StoredResponse> {
    let source = spec.source_hosts.iter().find(|host| url.contains(host.as_str()))?;
    let location = url.replacen(source.as_str(), &spec.target_host, 1);
    debug!(from = url, to = %location, "redirecting host");
    Some(redirect_to(&location))
}

/// A `302 Found` response to the given location.
pub fn redirect_to(location: &str) -> StoredResponse {
    let mut headers = HeaderMap::new();
    match HeaderValue::from_str(location) {
        Ok(value) => {
            headers.insert(header::LOCATION, value);
        }
        Err(_) => {
            // An unencodable location turns the redirect into a client error.
            return StoredResponse {
                status: StatusCode::BAD_REQUEST,
                headers,
                body: Bytes::new(),
            };
        }
    }
    StoredResponse {
        status: StatusCode::FOUND,
        headers,
        body: Bytes::new(),
    }
}
