//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Server returned an unexpected status code. The raw server text is
    /// carried for diagnostics.
    #[error("SMTP error {code}: {message}")]
    Smtp {
        /// Reply code (e.g., 550).
        code: u16,
        /// Raw reply text from the server.
        message: String,
    },

    /// Protocol error (malformed or unexpected response).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Feature not supported by the server.
    #[error("Server does not support {0}")]
    NotSupported(String),

    /// No matching reply arrived within the deadline. The connection must
    /// be discarded.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp(code: u16, message: impl Into<String>) -> Self {
        Self::Smtp {
            code,
            message: message.into(),
        }
    }

    /// Returns true if the error leaves the connection unusable.
    ///
    /// Transport failures, timeouts, and malformed replies poison the
    /// connection; a status-code rejection only fails the current
    /// transaction (except 421, which announces server shutdown).
    #[must_use]
    pub const fn is_connection_fatal(&self) -> bool {
        match self {
            Self::Io(_) | Self::Tls(_) | Self::InvalidDnsName(_) | Self::Protocol(_)
            | Self::Timeout(_) => true,
            Self::Smtp { code, .. } => *code == 421,
            Self::InvalidAddress(_) | Self::NotSupported(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_fatal_classification() {
        assert!(Error::Timeout(Duration::from_secs(30)).is_connection_fatal());
        assert!(Error::Protocol("garbage".into()).is_connection_fatal());
        assert!(Error::smtp(421, "shutting down").is_connection_fatal());
        assert!(!Error::smtp(550, "mailbox unavailable").is_connection_fatal());
        assert!(!Error::InvalidAddress("nope".into()).is_connection_fatal());
    }
}
