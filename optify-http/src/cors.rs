//! Permissive cross-origin headers for API responses.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use tracing::warn;

use crate::ext::AllowedMethods;
use crate::payload::{Payload, StoredResponse};

/// Methods advertised when the route does not declare its own set.
pub const DEFAULT_ALLOW_METHODS: &str = "GET, HEAD, POST, OPTIONS";

/// Preflight cache lifetime, in seconds.
const MAX_AGE_SECS: u32 = 21600;

/// Decorates the payload with permissive CORS headers.
///
/// `Access-Control-Allow-Origin` is always `*`; the advertised methods come
/// from the route's [`AllowedMethods`] extension when present, otherwise the
/// permissive default set. Prebuilt responses pass through undecorated.
pub fn crossdomain(payload: Payload, allow_methods: Option<&AllowedMethods>) -> Payload {
    let methods = match allow_methods {
        Some(methods) => match HeaderValue::from_str(&methods.to_header_value()) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "unusable method list, falling back to defaults");
                HeaderValue::from_static(DEFAULT_ALLOW_METHODS)
            }
        },
        None => HeaderValue::from_static(DEFAULT_ALLOW_METHODS),
    };
    payload
        .with_header(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        )
        .with_header(header::ACCESS_CONTROL_ALLOW_METHODS, methods)
        .with_header(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECS))
}

/// Builds a JSON response carrying the permissive CORS headers.
///
/// Used for middleware-generated responses, like the rate-limit rejection.
pub fn json_response(status: StatusCode, value: &serde_json::Value) -> StoredResponse {
    let body = serde_json::to_vec(value).unwrap_or_default();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let payload = crossdomain(
        Payload::WithMeta {
            body: Bytes::from(body),
            status,
            headers,
        },
        None,
    );
    payload.into_stored()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_methods_when_route_declares_none() {
        let stored = crossdomain(Payload::from(Bytes::from_static(b"{}")), None).into_stored();
        assert_eq!(stored.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            stored.headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            DEFAULT_ALLOW_METHODS
        );
        assert_eq!(stored.headers[header::ACCESS_CONTROL_MAX_AGE], "21600");
    }

    #[test]
    fn route_methods_override_the_default() {
        let methods = AllowedMethods(vec![http::Method::GET, http::Method::DELETE]);
        let stored =
            crossdomain(Payload::from(Bytes::from_static(b"{}")), Some(&methods)).into_stored();
        assert_eq!(
            stored.headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, DELETE"
        );
    }

    #[test]
    fn rejection_body_is_json_with_cors() {
        let stored = json_response(
            StatusCode::TOO_MANY_REQUESTS,
            &serde_json::json!({"status_code": 429}),
        );
        assert_eq!(stored.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(stored.headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(stored.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(stored.body.as_ref(), br#"{"status_code":429}"#);
    }
}
