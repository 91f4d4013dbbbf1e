//! Implementation for the not-authenticated state.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Client, check_ok};
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::connection::stream::ImapStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::ResponseCode;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a connected stream.
    ///
    /// Reads the server greeting, which must be `* OK` (or `* PREAUTH`);
    /// `* BYE` is an immediate error. Capabilities embedded in the
    /// greeting are recorded.
    pub async fn from_stream(stream: S, timeout: Duration) -> Result<Self> {
        let mut framed = FramedStream::new(stream, timeout);

        let greeting = framed.read_unit().await?;
        let response = ResponseParser::parse(&greeting)?;

        let mut capabilities = Vec::new();
        match response {
            Response::Untagged(UntaggedResponse::Ok { code, .. })
            | Response::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            debug: false,
            state: NotAuthenticated,
        })
    }

    /// Enables wire logging at debug level (instead of trace).
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Authenticates with LOGIN.
    ///
    /// Both credentials are sent quoted with backslash escaping. Consumes
    /// self and returns an authenticated client on success.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let cmd = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.send_command(&cmd).await?;
        self.absorb_capabilities(&response);
        check_ok(&response)?;

        tracing::debug!(user = username, "imap authenticated");

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            debug: self.debug,
            state: Authenticated,
        })
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Upgrades the connection with STARTTLS.
    ///
    /// Sends STARTTLS, and on the tagged OK constructs a new TLS transport
    /// around the existing TCP stream. The tag generator and capabilities
    /// carry over; capabilities should be re-fetched by callers that need
    /// post-upgrade accuracy.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        let response = self.send_command(&Command::StartTls).await?;
        check_ok(&response)?;

        let timeout = self.stream.timeout();
        let stream = self.stream.into_inner().upgrade_to_tls(host).await?;

        tracing::debug!(host, "connection upgraded to TLS");

        Ok(Self {
            stream: FramedStream::new(stream, timeout),
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            debug: self.debug,
            state: NotAuthenticated,
        })
    }
}
