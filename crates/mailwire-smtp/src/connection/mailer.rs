//! High-level mail submission wrapper.
//!
//! `Mailer` owns the connection lifecycle: each call connects, performs the
//! EHLO/STARTTLS/AUTH handshake, runs the submission(s), and tears the
//! connection down. Batch sends reuse one authenticated connection across
//! all messages, sequentially.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::client::{Authenticated, Client, SendResult};
use super::stream::{SmtpStream, connect_plain, connect_tls};
use crate::Result;
use crate::types::Address;
use mailwire_mime::OutgoingMessage;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption. **Not recommended for production.**
    None,
    /// Start with plaintext, upgrade with STARTTLS when advertised
    /// (port 587).
    StartTls,
    /// TLS from the start (port 465). **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Returns the default submission port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 587,
            Self::Implicit => 465,
        }
    }
}

/// Mailer configuration, immutable per connection.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Username for AUTH LOGIN.
    pub username: String,
    /// Password for AUTH LOGIN.
    pub password: String,
    /// Default sender in display form (`Name <addr>` or bare address),
    /// used when a message has no explicit sender.
    pub from: String,
    /// Domain announced in EHLO.
    pub ehlo_domain: String,
    /// Reply timeout; exceeding it poisons the connection.
    pub timeout: Duration,
}

impl MailerConfig {
    /// Default reply timeout for SMTP exchanges.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a configuration with the default port for the security mode.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self {
            host: host.into(),
            port: security.default_port(),
            security,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            ehlo_domain: "localhost".to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the default sender.
    #[must_use]
    pub fn sender(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// Sets the EHLO domain.
    #[must_use]
    pub fn ehlo_domain(mut self, domain: impl Into<String>) -> Self {
        self.ehlo_domain = domain.into();
        self
    }

    /// Sets the reply timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// High-level mail submission client.
pub struct Mailer {
    config: MailerConfig,
}

impl Mailer {
    /// Creates a mailer from a configuration.
    #[must_use]
    pub const fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Sends a single message on a fresh connection.
    ///
    /// Handshake failures propagate; submission failures are captured in
    /// the returned [`SendResult`]. The connection is closed either way.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting or authenticating fails.
    pub async fn send(&self, message: &mailwire_mime::OutgoingMessage) -> Result<SendResult> {
        let mut client = self.connect().await?;
        let result = client
            .send_mail(message, &self.config.from, &self.id_domain())
            .await;

        if client.is_dead() {
            drop(client);
        } else if let Err(e) = client.quit().await {
            tracing::debug!(error = %e, "QUIT failed");
        }

        Ok(result)
    }

    /// Sends a batch of messages over one authenticated connection.
    ///
    /// Messages are submitted sequentially. A rejection fails only its own
    /// message; once the connection itself dies, every remaining message
    /// receives a uniform unattempted result carrying the connection error.
    /// This method never fails the call: if the initial handshake fails,
    /// all messages are reported unattempted.
    pub async fn send_batch(&self, messages: &[OutgoingMessage]) -> Vec<SendResult> {
        let client = match self.connect().await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, host = %self.config.host, "batch connect failed");
                let error = e.to_string();
                return messages
                    .iter()
                    .map(|_| SendResult::not_attempted(error.clone()))
                    .collect();
            }
        };

        submit_batch(client, messages, &self.config.from, &self.id_domain()).await
    }

    /// Connects and drives the handshake to the authenticated state.
    async fn connect(&self) -> Result<Client<SmtpStream, Authenticated>> {
        let stream = match self.config.security {
            Security::Implicit => connect_tls(&self.config.host, self.config.port).await?,
            Security::StartTls | Security::None => {
                connect_plain(&self.config.host, self.config.port).await?
            }
        };

        tracing::debug!(host = %self.config.host, tls = stream.is_tls(), "smtp connected");
        let client = Client::from_stream(stream, self.config.timeout).await?;
        let client = client.ehlo(&self.config.ehlo_domain).await?;

        // Opportunistic upgrade: only when the server advertises it.
        let client = if self.config.security == Security::StartTls
            && client.server_info().supports_starttls()
        {
            client
                .starttls(&self.config.host, &self.config.ehlo_domain)
                .await?
        } else {
            if self.config.security == Security::StartTls {
                tracing::warn!(host = %self.config.host, "STARTTLS not advertised, continuing in plaintext");
            }
            client
        };

        client
            .auth_login(&self.config.username, &self.config.password)
            .await
    }

    /// Domain used for locally generated Message-IDs.
    fn id_domain(&self) -> String {
        Address::parse_display(&self.config.from)
            .map(|addr| addr.domain().to_string())
            .unwrap_or_else(|_| self.config.ehlo_domain.clone())
    }
}

/// Submits a batch of messages over an already-authenticated connection.
///
/// Messages run strictly sequentially. A per-message rejection only fails
/// that message; once the connection is dead, every remaining message gets
/// a uniform unattempted result carrying the connection error. The
/// connection is closed with a best-effort QUIT when it survived the batch.
pub async fn submit_batch<S>(
    mut client: Client<S, Authenticated>,
    messages: &[OutgoingMessage],
    fallback_from: &str,
    id_domain: &str,
) -> Vec<SendResult>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut results = Vec::with_capacity(messages.len());
    let mut connection_error: Option<String> = None;

    for message in messages {
        if let Some(error) = &connection_error {
            results.push(SendResult::not_attempted(error.clone()));
            continue;
        }

        let result = client.send_mail(message, fallback_from, id_domain).await;

        if client.is_dead() {
            connection_error = Some(
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "connection lost".to_string()),
            );
        }
        results.push(result);
    }

    if connection_error.is_none() {
        if let Err(e) = client.quit().await {
            tracing::debug!(error = %e, "QUIT failed");
        }
    }

    results
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
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 587);
        assert_eq!(Security::StartTls.default_port(), 587);
        assert_eq!(Security::Implicit.default_port(), 465);
    }

    #[test]
    fn test_config_builder() {
        let config = MailerConfig::new("smtp.example.com", Security::Implicit)
            .credentials("user", "pass")
            .sender("Notifications <noreply@example.com>")
            .timeout(Duration::from_secs(10));

        assert_eq!(config.port, 465);
        assert_eq!(config.username, "user");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_id_domain_from_sender() {
        let mailer = Mailer::new(
            MailerConfig::new("smtp.example.com", Security::Implicit)
                .sender("Notifications <noreply@mail.example.com>"),
        );
        assert_eq!(mailer.id_domain(), "mail.example.com");
    }

    #[test]
    fn test_id_domain_falls_back_to_ehlo_domain() {
        let mailer = Mailer::new(
            MailerConfig::new("smtp.example.com", Security::Implicit)
                .ehlo_domain("app.example.com"),
        );
        assert_eq!(mailer.id_domain(), "app.example.com");
    }
}
