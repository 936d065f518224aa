//! Tagged handler output model.
//!
//! A handler can produce a bare body, a body with explicit status and
//! headers, or a fully prebuilt response. The variant is carried explicitly
//! so every later stage knows what it holds without inspecting the value:
//! transformations apply to the first two variants and leave prebuilt
//! responses untouched.

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;

/// A complete buffered response, as stored in the memoization cache.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Buffered body.
    pub body: Bytes,
}

impl StoredResponse {
    /// Builds an `http` response from the stored parts.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl<B> From<Response<B>> for StoredResponse
where
    Bytes: From<B>,
{
    fn from(response: Response<B>) -> Self {
        let (parts, body) = response.into_parts();
        StoredResponse {
            status: parts.status,
            headers: parts.headers,
            body: Bytes::from(body),
        }
    }
}

/// Handler output, tagged by shape.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A bare body; status and headers take their defaults.
    Body(Bytes),
    /// A body with explicit status and headers.
    WithMeta {
        /// Buffered body.
        body: Bytes,
        /// Response status.
        status: StatusCode,
        /// Response headers.
        headers: HeaderMap,
    },
    /// A prebuilt response, exempt from transformations.
    Response(StoredResponse),
}

impl Payload {
    /// The buffered body of any variant.
    pub fn body(&self) -> &Bytes {
        match self {
            Payload::Body(body) => body,
            Payload::WithMeta { body, .. } => body,
            Payload::Response(response) => &response.body,
        }
    }

    /// Whether transformations apply to this payload.
    pub fn is_transformable(&self) -> bool {
        !matches!(self, Payload::Response(_))
    }

    /// Replaces the body, leaving prebuilt responses untouched.
    pub(crate) fn with_body(self, body: Bytes) -> Self {
        match self {
            Payload::Body(_) => Payload::Body(body),
            Payload::WithMeta { status, headers, .. } => Payload::WithMeta {
                body,
                status,
                headers,
            },
            response @ Payload::Response(_) => response,
        }
    }

    /// Sets a header on transformable payloads, promoting a bare body to
    /// [`Payload::WithMeta`] when needed.
    pub(crate) fn with_header(self, name: http::header::HeaderName, value: http::HeaderValue) -> Self {
        match self {
            Payload::Body(body) => {
                let mut headers = HeaderMap::new();
                headers.insert(name, value);
                Payload::WithMeta {
                    body,
                    status: StatusCode::OK,
                    headers,
                }
            }
            Payload::WithMeta {
                body,
                status,
                mut headers,
            } => {
                headers.insert(name, value);
                Payload::WithMeta {
                    body,
                    status,
                    headers,
                }
            }
            response @ Payload::Response(_) => response,
        }
    }

    /// Finishes the payload into a stored response.
    pub fn into_stored(self) -> StoredResponse {
        match self {
            Payload::Body(body) => StoredResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body,
            },
            Payload::WithMeta {
                body,
                status,
                headers,
            } => StoredResponse {
                status,
                headers,
                body,
            },
            Payload::Response(response) => response,
        }
    }
}

impl From<Bytes> for Payload {
    fn from(body: Bytes) -> Self {
        Payload::Body(body)
    }
}

impl From<StoredResponse> for Payload {
    fn from(response: StoredResponse) -> Self {
        Payload::Response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_body_promotes_on_header_insert() {
        let payload = Payload::from(Bytes::from_static(b"hello"))
            .with_header(http::header::VARY, http::HeaderValue::from_static("Accept-Encoding"));
        let stored = payload.into_stored();
        assert_eq!(stored.status, StatusCode::OK);
        assert_eq!(stored.headers[http::header::VARY], "Accept-Encoding");
        assert_eq!(stored.body.as_ref(), b"hello");
    }

    #[test]
    fn prebuilt_response_is_exempt() {
        let response = StoredResponse {
            status: StatusCode::IM_A_TEAPOT,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"tea"),
        };
        let payload = Payload::from(response)
            .with_body(Bytes::from_static(b"coffee"))
            .with_header(http::header::VARY, http::HeaderValue::from_static("*"));
        assert!(!payload.is_transformable());
        let stored = payload.into_stored();
        assert_eq!(stored.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(stored.body.as_ref(), b"tea");
        assert!(stored.headers.is_empty());
    }
}
