use thiserror::Error;

/// Failure inside a response transformation.
///
/// Transformations degrade gracefully: the caller logs the error and passes
/// the payload through untouched rather than failing the request.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The gzip encoder reported an I/O failure.
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),
}
