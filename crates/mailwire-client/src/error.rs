//! Error types for the client wrappers.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the high-level mail clients.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration (environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// SMTP-level failure.
    #[error(transparent)]
    Smtp(#[from] mailwire_smtp::Error),

    /// IMAP-level failure.
    #[error(transparent)]
    Imap(#[from] mailwire_imap::Error),
}
