//! Gzip body compression.

use std::io::Write;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use http::header;
use tracing::{trace, warn};

use crate::error::TransformError;
use crate::payload::Payload;

/// Gzip-compresses the payload body and sets the matching headers.
///
/// Prebuilt responses and empty bodies pass through. On encoder failure the
/// payload is returned uncompressed and the error is logged, so the client
/// still gets a valid, merely larger, response.
pub fn compress_payload(payload: Payload) -> Payload {
    if !payload.is_transformable() || payload.body().is_empty() {
        return payload;
    }
    match gzip(payload.body()) {
        Ok(compressed) => {
            trace!(
                before = payload.body().len(),
                after = compressed.len(),
                "compressed body"
            );
            let length = compressed.len();
            payload
                .with_body(compressed)
                .with_header(
                    header::CONTENT_ENCODING,
                    http::HeaderValue::from_static("gzip"),
                )
                .with_header(header::VARY, http::HeaderValue::from_static("Accept-Encoding"))
                .with_header(header::CONTENT_LENGTH, http::HeaderValue::from(length))
        }
        Err(err) => {
            warn!(error = %err, "compression failed, sending body uncompressed");
            payload
        }
    }
}

fn gzip(body: &[u8]) -> Result<Bytes, TransformError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder.write_all(body)?;
    Ok(Bytes::from(encoder.finish()?))
}
