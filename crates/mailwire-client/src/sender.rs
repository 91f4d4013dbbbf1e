//! Outbound mail submission.
//!
//! Thin wrapper over [`mailwire_smtp::Mailer`] wiring in environment
//! configuration. Used by route handlers to send notification batches on
//! ticket and status changes.

use crate::config::SmtpSettings;
use crate::error::Result;
use mailwire_mime::OutgoingMessage;
use mailwire_smtp::{Mailer, MailerConfig, SendResult};

/// Environment-configured SMTP client.
pub struct SmtpClient {
    mailer: Mailer,
}

impl SmtpClient {
    /// Builds a client from `SMTP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(SmtpSettings::from_env()?.into_config()))
    }

    /// Builds a client from an explicit configuration.
    #[must_use]
    pub const fn new(config: MailerConfig) -> Self {
        Self {
            mailer: Mailer::new(config),
        }
    }

    /// Sends one message on a fresh connection.
    ///
    /// Handshake failures propagate; submission failures are captured in
    /// the result. The connection is closed either way.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting or authenticating fails.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<SendResult> {
        Ok(self.mailer.send(message).await?)
    }

    /// Sends a batch of messages over one authenticated connection.
    ///
    /// Never fails the call: handshake failures are reported as
    /// unattempted results for every message, and a rejection fails only
    /// its own message. See [`mailwire_smtp::SendResult`] for the result
    /// shape.
    pub async fn send_batch(&self, messages: &[OutgoingMessage]) -> Vec<SendResult> {
        tracing::debug!(count = messages.len(), "sending notification batch");
        self.mailer.send_batch(messages).await
    }
}
