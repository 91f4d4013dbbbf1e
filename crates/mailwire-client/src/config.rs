//! Environment-driven configuration.
//!
//! Settings are read from `SMTP_*` and `IMAP_*` environment variables.
//! Host, user, and password are required; ports fall back to the standard
//! port for the configured security mode, and the secure flags default to
//! true (implicit TLS). `SMTP_SECURE=false`/`IMAP_SECURE=false` selects
//! plaintext with opportunistic STARTTLS.

use std::time::Duration;

use crate::error::{Error, Result};
use mailwire_smtp::MailerConfig;

/// SMTP submission settings.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Server hostname (`SMTP_HOST`).
    pub host: String,
    /// Server port (`SMTP_PORT`).
    pub port: u16,
    /// Security mode (`SMTP_SECURE`).
    pub security: mailwire_smtp::Security,
    /// Username (`SMTP_USER`).
    pub username: String,
    /// Password (`SMTP_PASS`).
    pub password: String,
    /// Default sender display form, from `SMTP_FROM_NAME` and
    /// `SMTP_FROM_EMAIL` (falling back to the username).
    pub from: String,
}

impl SmtpSettings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through a lookup function (injectable for tests).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = require(&lookup, "SMTP_HOST")?;
        let username = require(&lookup, "SMTP_USER")?;
        let password = require(&lookup, "SMTP_PASS")?;

        let security = if flag(&lookup, "SMTP_SECURE").unwrap_or(true) {
            mailwire_smtp::Security::Implicit
        } else {
            mailwire_smtp::Security::StartTls
        };
        let port = port(&lookup, "SMTP_PORT")?.unwrap_or_else(|| security.default_port());

        let from_email = lookup("SMTP_FROM_EMAIL").unwrap_or_else(|| username.clone());
        let from = lookup("SMTP_FROM_NAME")
            .filter(|name| !name.is_empty())
            .map_or_else(
                || from_email.clone(),
                |name| format!("{name} <{from_email}>"),
            );

        Ok(Self {
            host,
            port,
            security,
            username,
            password,
            from,
        })
    }

    /// Converts the settings into a mailer configuration.
    #[must_use]
    pub fn into_config(self) -> MailerConfig {
        let ehlo_domain = mailwire_smtp::Address::parse_display(&self.from)
            .map_or_else(|_| "localhost".to_string(), |a| a.domain().to_string());

        MailerConfig::new(self.host, self.security)
            .port(self.port)
            .credentials(self.username, self.password)
            .sender(self.from)
            .ehlo_domain(ehlo_domain)
    }
}

/// IMAP mailbox-reading settings.
#[derive(Debug, Clone)]
pub struct ImapSettings {
    /// Server hostname (`IMAP_HOST`).
    pub host: String,
    /// Server port (`IMAP_PORT`).
    pub port: u16,
    /// Security mode (`IMAP_SECURE`).
    pub security: mailwire_imap::Security,
    /// Username (`IMAP_USER`).
    pub username: String,
    /// Password (`IMAP_PASS`).
    pub password: String,
    /// Response timeout.
    pub timeout: Duration,
    /// Wire-level debug logging (`IMAP_DEBUG`).
    pub debug: bool,
}

impl ImapSettings {
    /// Default response timeout for IMAP exchanges.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through a lookup function (injectable for tests).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = require(&lookup, "IMAP_HOST")?;
        let username = require(&lookup, "IMAP_USER")?;
        let password = require(&lookup, "IMAP_PASS")?;

        let security = if flag(&lookup, "IMAP_SECURE").unwrap_or(true) {
            mailwire_imap::Security::Implicit
        } else {
            mailwire_imap::Security::StartTls
        };
        let port = port(&lookup, "IMAP_PORT")?.unwrap_or_else(|| security.default_port());
        let debug = flag(&lookup, "IMAP_DEBUG").unwrap_or(false);

        Ok(Self {
            host,
            port,
            security,
            username,
            password,
            timeout: Self::DEFAULT_TIMEOUT,
            debug,
        })
    }
}

fn require(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    lookup(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}

fn flag(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<bool> {
    lookup(name).map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn port(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<u16>> {
    lookup(name)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("{name} is not a valid port: {value}")))
        })
        .transpose()
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
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn smtp_settings_defaults() {
        let settings = SmtpSettings::from_lookup(env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "bot@example.com"),
            ("SMTP_PASS", "secret"),
        ]))
        .unwrap();

        assert_eq!(settings.host, "smtp.example.com");
        assert_eq!(settings.security, mailwire_smtp::Security::Implicit);
        assert_eq!(settings.port, 465);
        // Sender falls back to the username.
        assert_eq!(settings.from, "bot@example.com");
    }

    #[test]
    fn smtp_settings_starttls_and_sender() {
        let settings = SmtpSettings::from_lookup(env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "bot@example.com"),
            ("SMTP_PASS", "secret"),
            ("SMTP_SECURE", "false"),
            ("SMTP_PORT", "2525"),
            ("SMTP_FROM_NAME", "Support"),
            ("SMTP_FROM_EMAIL", "support@example.com"),
        ]))
        .unwrap();

        assert_eq!(settings.security, mailwire_smtp::Security::StartTls);
        assert_eq!(settings.port, 2525);
        assert_eq!(settings.from, "Support <support@example.com>");

        let config = settings.into_config();
        assert_eq!(config.ehlo_domain, "example.com");
    }

    #[test]
    fn smtp_settings_missing_host() {
        let err = SmtpSettings::from_lookup(env(&[
            ("SMTP_USER", "bot@example.com"),
            ("SMTP_PASS", "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"));
    }

    #[test]
    fn smtp_settings_bad_port() {
        let err = SmtpSettings::from_lookup(env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "bot@example.com"),
            ("SMTP_PASS", "secret"),
            ("SMTP_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SMTP_PORT"));
    }

    #[test]
    fn imap_settings_defaults() {
        let settings = ImapSettings::from_lookup(env(&[
            ("IMAP_HOST", "imap.example.com"),
            ("IMAP_USER", "bot@example.com"),
            ("IMAP_PASS", "secret"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 993);
        assert_eq!(settings.security, mailwire_imap::Security::Implicit);
        assert!(!settings.debug);
    }

    #[test]
    fn imap_settings_plaintext_and_debug() {
        let settings = ImapSettings::from_lookup(env(&[
            ("IMAP_HOST", "imap.example.com"),
            ("IMAP_USER", "bot@example.com"),
            ("IMAP_PASS", "secret"),
            ("IMAP_SECURE", "0"),
            ("IMAP_DEBUG", "1"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 143);
        assert_eq!(settings.security, mailwire_imap::Security::StartTls);
        assert!(settings.debug);
    }
}
