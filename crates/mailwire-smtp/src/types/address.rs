//! Email address types.

use crate::error::{Error, Result};

/// Bare email address for the SMTP envelope (`MAIL FROM`/`RCPT TO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a bare `local@domain` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is structurally invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Extracts the bare address from a display form.
    ///
    /// Accepts both `Name <local@domain>` and bare `local@domain`; message
    /// recipient lists carry the display form, the envelope needs the bare
    /// addr-spec.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid address can be extracted.
    pub fn parse_display(display: &str) -> Result<Self> {
        let display = display.trim();
        if let (Some(open), Some(close)) = (display.rfind('<'), display.rfind('>')) {
            if open < close {
                return Self::new(display[open + 1..close].trim());
            }
        }
        Self::new(display)
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the address.
    ///
    /// Validation guarantees the `@` separator is present.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }

    /// Validates an email address (basic structural validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!(
                "Address must contain @: {addr}"
            )));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidAddress(format!("Malformed address: {addr}")));
        }

        if addr.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
            return Err(Error::InvalidAddress(format!(
                "Address contains illegal characters: {addr}"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        let addr = Address::new("user@example.com").unwrap();
        assert_eq!(addr.as_str(), "user@example.com");
        assert_eq!(addr.domain(), "example.com");
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(Address::new("").is_err());
        assert!(Address::new("userexample.com").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("user@").is_err());
        assert!(Address::new("user@ex@ample.com").is_err());
        assert!(Address::new("user name@example.com").is_err());
    }

    #[test]
    fn test_parse_display_with_name() {
        let addr = Address::parse_display("John Doe <john@example.com>").unwrap();
        assert_eq!(addr.as_str(), "john@example.com");
    }

    #[test]
    fn test_parse_display_bare() {
        let addr = Address::parse_display("  jane@example.com ").unwrap();
        assert_eq!(addr.as_str(), "jane@example.com");
    }

    #[test]
    fn test_parse_display_angle_only() {
        let addr = Address::parse_display("<bot@example.com>").unwrap();
        assert_eq!(addr.as_str(), "bot@example.com");
    }

    #[test]
    fn test_parse_display_malformed() {
        assert!(Address::parse_display("John Doe").is_err());
        assert!(Address::parse_display("John > Doe <").is_err());
    }
}
