//! Type-state SMTP client.

use std::marker::PhantomData;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::SmtpStream;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{ReplyBuffer, parse_reply};
use crate::types::{Address, Reply, ReplyCode};
use mailwire_mime::OutgoingMessage;

/// Type-state marker for the connected (pre-auth) state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for the authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Server capabilities from the EHLO response.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the EHLO greeting line.
    pub hostname: String,
    /// Raw extension lines advertised by the server.
    pub extensions: Vec<String>,
}

impl ServerInfo {
    /// Checks if STARTTLS is advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions
            .iter()
            .any(|line| line.split_whitespace().next() == Some("STARTTLS"))
    }
}

/// Outcome of a single message submission.
///
/// `send_mail` never fails the surrounding call; rejections and transport
/// failures are captured here so a batch can keep going. `attempted`
/// distinguishes "tried and refused" from "never tried because the
/// connection was already gone".
#[derive(Debug, Clone)]
pub struct SendResult {
    /// True when the server accepted the message (final 250).
    pub success: bool,
    /// Locally generated Message-ID, absent for unattempted messages.
    pub message_id: Option<String>,
    /// Server text from the final reply on success.
    pub response: Option<String>,
    /// Error description on failure.
    pub error: Option<String>,
    /// False when the message was never submitted (dead connection).
    pub attempted: bool,
}

impl SendResult {
    pub(crate) fn sent(message_id: String, response: String) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            response: Some(response),
            error: None,
            attempted: true,
        }
    }

    pub(crate) fn failed(message_id: String, error: String) -> Self {
        Self {
            success: false,
            message_id: Some(message_id),
            response: None,
            error: Some(error),
            attempted: true,
        }
    }

    pub(crate) fn not_attempted(error: String) -> Self {
        Self {
            success: false,
            message_id: None,
            response: None,
            error: Some(error),
            attempted: false,
        }
    }
}

/// SMTP client with type-state connection management.
///
/// Generic over the stream so protocol flows can be driven against mock
/// streams in tests. One command is in flight at a time; every operation
/// takes `&mut self` or consumes `self`, which makes pipelining
/// unrepresentable.
pub struct Client<S, State> {
    stream: S,
    replies: ReplyBuffer,
    server_info: ServerInfo,
    timeout: Duration,
    dead: bool,
    _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server_info", &self.server_info)
            .field("dead", &self.dead)
            .finish_non_exhaustive()
    }
}

// Common implementation for all states
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server information discovered via EHLO.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Sends a command and waits for the complete reply.
    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        tracing::trace!(command = %cmd.redacted(), "sending");
        self.stream.write_all(&cmd.serialize()).await?;
        self.stream.flush().await?;
        self.read_reply().await
    }

    /// Reads one complete reply, feeding the framer until it yields.
    async fn read_reply(&mut self) -> Result<Reply> {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(lines) = self.replies.try_next()? {
                let reply = parse_reply(&lines)?;
                tracing::trace!(code = %reply.code, "reply");
                return Ok(reply);
            }

            let n = tokio::time::timeout(self.timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| Error::Timeout(self.timeout))??;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.replies.extend(&chunk[..n]);
        }
    }

    /// Checks a reply against the accepted codes, embedding the raw server
    /// text on mismatch.
    fn expect(reply: Reply, accepted: &[ReplyCode]) -> Result<Reply> {
        if accepted.contains(&reply.code) {
            Ok(reply)
        } else {
            Err(Error::smtp(reply.code.as_u16(), reply.message_text()))
        }
    }

    /// Sends NOOP to keep the connection alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn noop(&mut self) -> Result<()> {
        let reply = self.send_command(&Command::Noop).await?;
        Self::expect(reply, &[ReplyCode::OK]).map(|_| ())
    }

    /// Sends QUIT and drops the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT exchange fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp(reply.code.as_u16(), reply.message_text()));
        }
        Ok(())
    }
}

impl<S> Client<S, Connected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is not 220.
    pub async fn from_stream(stream: S, timeout: Duration) -> Result<Self> {
        let mut client = Self {
            stream,
            replies: ReplyBuffer::new(),
            server_info: ServerInfo::default(),
            timeout,
            dead: false,
            _state: PhantomData,
        };

        let greeting = client.read_reply().await?;
        Self::expect(greeting, &[ReplyCode::SERVICE_READY])?;
        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.send_command(&cmd).await?;
        let reply = Self::expect(reply, &[ReplyCode::OK])?;

        self.server_info = ServerInfo {
            hostname: reply
                .message
                .first()
                .and_then(|line| line.split_whitespace().next())
                .unwrap_or("unknown")
                .to_string(),
            // First line is the greeting, the rest advertise extensions.
            extensions: reply.message.iter().skip(1).cloned().collect(),
        };

        Ok(self)
    }

    /// Authenticates with AUTH LOGIN (334 challenge per credential, 235 on
    /// success).
    ///
    /// # Errors
    ///
    /// Returns an error with the raw server text on any unexpected code.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let reply = self.send_command(&Command::AuthLogin).await?;
        Self::expect(reply, &[ReplyCode::AUTH_CONTINUE])?;

        let reply = self
            .send_command(&Command::AuthData {
                data: STANDARD.encode(username.as_bytes()),
            })
            .await?;
        Self::expect(reply, &[ReplyCode::AUTH_CONTINUE])?;

        let reply = self
            .send_command(&Command::AuthData {
                data: STANDARD.encode(password.as_bytes()),
            })
            .await?;
        Self::expect(reply, &[ReplyCode::AUTH_SUCCESS])?;

        tracing::debug!(server = %self.server_info.hostname, "authenticated");

        Ok(Client {
            stream: self.stream,
            replies: self.replies,
            server_info: self.server_info,
            timeout: self.timeout,
            dead: self.dead,
            _state: PhantomData,
        })
    }
}

impl Client<SmtpStream, Connected> {
    /// Upgrades the connection with STARTTLS and re-issues EHLO.
    ///
    /// The framer and server info carry over; only the transport changes.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised, the server refuses
    /// the upgrade, or the TLS handshake fails.
    pub async fn starttls(mut self, server_name: &str, ehlo_domain: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }

        let reply = self.send_command(&Command::StartTls).await?;
        Self::expect(reply, &[ReplyCode::SERVICE_READY])?;

        let stream = self.stream.upgrade_to_tls(server_name).await?;
        let client = Self {
            stream,
            replies: self.replies,
            server_info: self.server_info,
            timeout: self.timeout,
            dead: self.dead,
            _state: PhantomData,
        };

        // EHLO is required again after the upgrade; extensions may differ.
        client.ehlo(ehlo_domain).await
    }
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns true once the connection has failed and must be discarded.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Submits one message, capturing any failure in the result.
    ///
    /// This method intentionally never returns an error so a batch of
    /// independent messages is not aborted by one bad recipient or body.
    /// After a rejection the transaction is reset with RSET; transport
    /// failures mark the connection dead instead.
    pub async fn send_mail(
        &mut self,
        message: &OutgoingMessage,
        fallback_from: &str,
        id_domain: &str,
    ) -> SendResult {
        let built = message.build(fallback_from, id_domain);

        match self.run_transaction(message, &built.bytes, fallback_from).await {
            Ok(response) => {
                tracing::debug!(message_id = %built.message_id, "message accepted");
                SendResult::sent(built.message_id, response)
            }
            Err(e) => {
                tracing::warn!(message_id = %built.message_id, error = %e, "message failed");
                if e.is_connection_fatal() {
                    self.dead = true;
                } else if self.reset().await.is_err() {
                    self.dead = true;
                }
                SendResult::failed(built.message_id, e.to_string())
            }
        }
    }

    /// Drives one MAIL FROM / RCPT TO / DATA transaction to completion.
    async fn run_transaction(
        &mut self,
        message: &OutgoingMessage,
        body: &[u8],
        fallback_from: &str,
    ) -> Result<String> {
        let sender = Address::parse_display(message.from.as_deref().unwrap_or(fallback_from))?;

        let recipients = message.all_recipients();
        if recipients.is_empty() {
            return Err(Error::InvalidAddress("No recipients specified".into()));
        }

        let reply = self
            .send_command(&Command::MailFrom { from: sender })
            .await?;
        Self::expect(reply, &[ReplyCode::OK])?;

        for recipient in recipients {
            let to = Address::parse_display(recipient)?;
            let reply = self.send_command(&Command::RcptTo { to }).await?;
            // 251 means the server will forward; still a success.
            Self::expect(reply, &[ReplyCode::OK, ReplyCode::FORWARD])?;
        }

        let reply = self.send_command(&Command::Data).await?;
        Self::expect(reply, &[ReplyCode::START_DATA])?;

        self.write_message_data(body).await?;

        let reply = self.read_reply().await?;
        let reply = Self::expect(reply, &[ReplyCode::OK])?;
        Ok(reply.message_text())
    }

    /// Writes the message body with CRLF normalization and dot-stuffing,
    /// followed by the terminating `.` line.
    async fn write_message_data(&mut self, message: &[u8]) -> Result<()> {
        for line in message.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.first() == Some(&b'.') {
                self.stream.write_all(b".").await?;
            }
            self.stream.write_all(line).await?;
            self.stream.write_all(b"\r\n").await?;
        }

        self.stream.write_all(b".\r\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Aborts the current transaction.
    async fn reset(&mut self) -> Result<()> {
        let reply = self.send_command(&Command::Rset).await?;
        Self::expect(reply, &[ReplyCode::OK]).map(|_| ())
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
    use tokio_test::io::Builder;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_greeting_accepted() {
        let mock = Builder::new().read(b"220 smtp.example.com ready\r\n").build();
        let client = Client::from_stream(mock, TIMEOUT).await;
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_greeting_rejected() {
        let mock = Builder::new().read(b"554 no service\r\n").build();
        let err = Client::from_stream(mock, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, Error::Smtp { code: 554, .. }));
    }

    #[tokio::test]
    async fn test_ehlo_parses_extensions() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO client.example.com\r\n")
            .read(b"250-smtp.example.com greets you\r\n250-STARTTLS\r\n250 AUTH LOGIN\r\n")
            .build();

        let client = Client::from_stream(mock, TIMEOUT).await.unwrap();
        let client = client.ehlo("client.example.com").await.unwrap();

        assert_eq!(client.server_info().hostname, "smtp.example.com");
        assert!(client.server_info().supports_starttls());
    }

    #[tokio::test]
    async fn test_auth_login_exchange() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250-x\r\n250 AUTH LOGIN\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"235 Authentication successful\r\n")
            .build();

        let client = Client::from_stream(mock, TIMEOUT).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let client = client.auth_login("user", "pass").await;
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_auth_login_bad_password_embeds_server_text() {
        let mock = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"EHLO localhost\r\n")
            .read(b"250 x\r\n")
            .write(b"AUTH LOGIN\r\n")
            .read(b"334 VXNlcm5hbWU6\r\n")
            .write(b"dXNlcg==\r\n")
            .read(b"334 UGFzc3dvcmQ6\r\n")
            .write(b"cGFzcw==\r\n")
            .read(b"535 5.7.8 Bad credentials\r\n")
            .build();

        let client = Client::from_stream(mock, TIMEOUT).await.unwrap();
        let client = client.ehlo("localhost").await.unwrap();
        let err = client.auth_login("user", "pass").await.unwrap_err();
        assert!(err.to_string().contains("Bad credentials"));
    }
}
