//! Type-state IMAP client connection.
//!
//! Uses the type-state pattern to enforce valid state transitions at
//! compile time:
//!
//! - `NotAuthenticated`: Initial state after connection
//! - `Authenticated`: After successful LOGIN
//! - `Selected`: After successful SELECT/EXAMINE
//!
//! Each state only exposes methods that are valid for that state, and all
//! operations take `&mut self` or consume `self`, so a second in-flight
//! command per connection is unrepresentable.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::selected::BodySections;
pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::{CommandResponse, FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time;
/// `Selected` additionally carries the current mailbox snapshot.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) debug: bool,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns true if the server advertises STARTTLS.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.has_capability(&Capability::StartTls)
    }

    /// Returns true if LOGIN is disabled (e.g., before STARTTLS).
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has_capability(&Capability::LoginDisabled)
    }

    /// Sends a command and collects its responses up to the tagged
    /// completion. Correlation is strictly temporal: one command is in
    /// flight at a time.
    pub(crate) async fn send_command(&mut self, cmd: &Command) -> Result<CommandResponse> {
        let tag = self.tag_gen.next();

        if self.debug {
            tracing::debug!(command = %cmd.redacted(&tag), "imap send");
        } else {
            tracing::trace!(command = %cmd.redacted(&tag), "imap send");
        }

        self.stream.write_command(&cmd.serialize(&tag)).await?;
        ResponseAccumulator::new(&tag)
            .read_until_tagged(&mut self.stream)
            .await
    }

    /// Refreshes capabilities from any CAPABILITY data in a response.
    pub(crate) fn absorb_capabilities(&mut self, response: &CommandResponse) {
        for untagged in parse_untagged(response) {
            if let UntaggedResponse::Capability(caps) = untagged {
                self.capabilities = caps;
            }
        }
    }

    /// Sends a NOOP command to keep the connection alive.
    pub async fn noop(&mut self) -> Result<()> {
        let response = self.send_command(&Command::Noop).await?;
        check_ok(&response)
    }

    /// Sends a CAPABILITY command and updates the stored capabilities.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let response = self.send_command(&Command::Capability).await?;
        check_ok(&response)?;
        self.absorb_capabilities(&response);
        Ok(self.capabilities.clone())
    }

    /// Gracefully disconnects: best-effort LOGOUT, errors swallowed, then
    /// the socket closes on drop.
    pub async fn logout(mut self) {
        if let Err(e) = self.send_command(&Command::Logout).await {
            tracing::debug!(error = %e, "LOGOUT failed");
        }
    }
}

/// Checks that a command's tagged completion is OK, mapping NO/BAD/BYE to
/// errors carrying the server text.
pub(crate) fn check_ok(response: &CommandResponse) -> Result<()> {
    match ResponseParser::parse(&response.tagged)? {
        Response::Tagged { status, text, .. } => match status {
            Status::Ok | Status::PreAuth => Ok(()),
            Status::No => Err(Error::No(text)),
            Status::Bad => Err(Error::Bad(text)),
            Status::Bye => Err(Error::Bye(text)),
        },
        _ => Err(Error::Protocol("missing tagged response".to_string())),
    }
}

/// Parses the untagged units of a response, skipping anything this client
/// does not understand (servers vary).
pub(crate) fn parse_untagged(response: &CommandResponse) -> Vec<UntaggedResponse> {
    response
        .untagged
        .iter()
        .filter_map(|unit| match ResponseParser::parse(unit) {
            Ok(Response::Untagged(untagged)) => Some(untagged),
            _ => None,
        })
        .collect()
}
