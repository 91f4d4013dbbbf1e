//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Client, check_ok, parse_untagged};
use super::states::{Authenticated, Selected};
use crate::command::Command;
use crate::connection::framed::CommandResponse;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{ListEntry, Mailbox, MailboxInfo, ResponseCode};
use crate::Result;

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Lists mailboxes matching a pattern (`list("", "*")` for all).
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let cmd = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;

        Ok(parse_untagged(&response)
            .into_iter()
            .filter_map(|untagged| match untagged {
                UntaggedResponse::List(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// Selects a mailbox for read-write access.
    ///
    /// Consumes self and returns a selected client carrying the mailbox
    /// snapshot.
    pub async fn select(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        let cmd = Command::Select {
            mailbox: Mailbox::new(mailbox),
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;
        let info = parse_mailbox_info(mailbox, &response);

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            debug: self.debug,
            state: Selected::new(info),
        })
    }

    /// Examines a mailbox for read-only access.
    pub async fn examine(mut self, mailbox: &str) -> Result<Client<S, Selected>> {
        let cmd = Command::Examine {
            mailbox: Mailbox::new(mailbox),
        };

        let response = self.send_command(&cmd).await?;
        check_ok(&response)?;
        let mut info = parse_mailbox_info(mailbox, &response);
        info.read_only = true;

        Ok(Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            debug: self.debug,
            state: Selected::new(info),
        })
    }
}

/// Builds a mailbox snapshot from SELECT/EXAMINE responses: untagged
/// EXISTS/RECENT/FLAGS plus the bracketed codes on untagged OK lines and
/// the tagged completion.
pub(crate) fn parse_mailbox_info(name: &str, response: &CommandResponse) -> MailboxInfo {
    let mut info = MailboxInfo {
        name: name.to_string(),
        ..MailboxInfo::default()
    };

    let absorb_code = |code: &ResponseCode, info: &mut MailboxInfo| match code {
        ResponseCode::UidValidity(v) => info.uid_validity = Some(*v),
        ResponseCode::UidNext(v) => info.uid_next = Some(*v),
        ResponseCode::Unseen(v) => info.unseen = Some(*v),
        ResponseCode::ReadOnly => info.read_only = true,
        ResponseCode::ReadWrite => info.read_only = false,
        _ => {}
    };

    for unit in &response.untagged {
        if let Ok(Response::Untagged(untagged)) = ResponseParser::parse(unit) {
            match untagged {
                UntaggedResponse::Exists(n) => info.exists = n,
                UntaggedResponse::Recent(n) => info.recent = n,
                UntaggedResponse::Flags(flags) => info.flags = flags,
                UntaggedResponse::Ok {
                    code: Some(code), ..
                } => absorb_code(&code, &mut info),
                _ => {}
            }
        }
    }

    if let Ok(Response::Tagged {
        code: Some(code), ..
    }) = ResponseParser::parse(&response.tagged)
    {
        absorb_code(&code, &mut info);
    }

    info
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
    fn test_parse_mailbox_info() {
        let response = CommandResponse {
            tagged: b"A002 OK [READ-WRITE] SELECT completed\r\n".to_vec(),
            untagged: vec![
                b"* 25 EXISTS\r\n".to_vec(),
                b"* 3 RECENT\r\n".to_vec(),
                b"* FLAGS (\\Seen \\Deleted)\r\n".to_vec(),
                b"* OK [UNSEEN 12] first unseen\r\n".to_vec(),
                b"* OK [UIDVALIDITY 1644312381] UIDs valid\r\n".to_vec(),
                b"* OK [UIDNEXT 4392] predicted next UID\r\n".to_vec(),
            ],
        };

        let info = parse_mailbox_info("INBOX", &response);
        assert_eq!(info.name, "INBOX");
        assert_eq!(info.exists, 25);
        assert_eq!(info.recent, 3);
        assert_eq!(info.unseen.unwrap().get(), 12);
        assert_eq!(info.uid_next.unwrap().get(), 4392);
        assert_eq!(info.uid_validity.unwrap().get(), 1644312381);
        assert!(!info.read_only);
        assert!(info.flags.is_seen());
        assert!(info.flags.is_deleted());
    }

    #[test]
    fn test_parse_mailbox_info_read_only() {
        let response = CommandResponse {
            tagged: b"A003 OK [READ-ONLY] EXAMINE completed\r\n".to_vec(),
            untagged: vec![b"* 4 EXISTS\r\n".to_vec()],
        };

        let info = parse_mailbox_info("Archive", &response);
        assert!(info.read_only);
        assert_eq!(info.exists, 4);
    }
}
