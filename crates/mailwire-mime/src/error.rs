//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid Base64 data.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Invalid encoding (quoted-printable or encoded-word).
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Invalid Content-Type header.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Decoded data is not valid UTF-8.
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
