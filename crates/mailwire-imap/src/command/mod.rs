//! IMAP command builder.
//!
//! Types and serialization for the IMAP commands this client issues.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, SequenceSet, UidSet};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, SearchCriteria, StoreAction};

use serialize::{
    write_fetch_items, write_mailbox, write_quoted, write_search_criteria, write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any State Commands
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,

    // Not Authenticated State Commands
    /// STARTTLS command.
    StartTls,
    /// LOGIN command. Both credentials are sent as quoted strings with
    /// backslash escaping.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },

    // Authenticated State Commands
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },

    // Selected State Commands
    /// EXPUNGE command.
    Expunge,
    /// SEARCH command.
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
        /// Use UIDs.
        uid: bool,
    },
    /// FETCH command over a sequence range.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
    },
    /// UID FETCH command.
    UidFetch {
        /// UID set.
        uids: UidSet,
        /// Items to fetch.
        items: FetchItems,
    },
    /// UID STORE command.
    UidStore {
        /// UID set.
        uids: UidSet,
        /// Store action.
        action: StoreAction,
    },
}

impl Command {
    /// Serializes the command to bytes with the given tag, CRLF-terminated.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
            Self::StartTls => buf.extend_from_slice(b"STARTTLS"),
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_quoted(&mut buf, username);
                buf.push(b' ');
                write_quoted(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
            }
            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_mailbox(&mut buf, mailbox);
            }
            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_quoted(&mut buf, reference);
                buf.push(b' ');
                write_quoted(&mut buf, pattern);
            }
            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),
            Self::Search { criteria, uid } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }
            Self::Fetch { sequence, items } => {
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
            }
            Self::UidFetch { uids, items } => {
                buf.extend_from_slice(b"UID FETCH ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
            }
            Self::UidStore { uids, action } => {
                buf.extend_from_slice(b"UID STORE ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a loggable rendering of the command with credentials elided.
    #[must_use]
    pub fn redacted(&self, tag: &str) -> String {
        match self {
            Self::Login { username, .. } => format!("{tag} LOGIN \"{username}\" <password>"),
            other => String::from_utf8_lossy(&other.serialize(tag))
                .trim_end()
                .to_string(),
        }
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
    use crate::types::{Flag, Uid};

    fn render(cmd: &Command) -> String {
        String::from_utf8(cmd.serialize("A0001")).unwrap()
    }

    #[test]
    fn test_capability() {
        assert_eq!(render(&Command::Capability), "A0001 CAPABILITY\r\n");
    }

    #[test]
    fn test_login_quotes_and_escapes() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "p\"w\\d".to_string(),
        };
        assert_eq!(
            render(&cmd),
            "A0001 LOGIN \"user@example.com\" \"p\\\"w\\\\d\"\r\n"
        );
    }

    #[test]
    fn test_login_redacted() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "secret".to_string(),
        };
        let redacted = cmd.redacted("A0001");
        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("user@example.com"));
    }

    #[test]
    fn test_select_quotes_when_needed() {
        let cmd = Command::Select {
            mailbox: Mailbox::new("Sent Items"),
        };
        assert_eq!(render(&cmd), "A0001 SELECT \"Sent Items\"\r\n");

        let cmd = Command::Select {
            mailbox: Mailbox::inbox(),
        };
        assert_eq!(render(&cmd), "A0001 SELECT INBOX\r\n");
    }

    #[test]
    fn test_list_all() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(render(&cmd), "A0001 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn test_fetch_range() {
        let cmd = Command::Fetch {
            sequence: crate::types::SequenceSet::range(16, 25).unwrap(),
            items: FetchItems::header_summary(),
        };
        assert_eq!(
            render(&cmd),
            "A0001 FETCH 16:25 (UID FLAGS ENVELOPE RFC822.SIZE)\r\n"
        );
    }

    #[test]
    fn test_uid_fetch_body() {
        let cmd = Command::UidFetch {
            uids: UidSet::single(Uid::new(42).unwrap()),
            items: FetchItems::body_sections(),
        };
        assert_eq!(
            render(&cmd),
            "A0001 UID FETCH 42 (BODY[HEADER] BODY[TEXT])\r\n"
        );
    }

    #[test]
    fn test_uid_search() {
        let cmd = Command::Search {
            criteria: SearchCriteria::any_recipient(&["a@x".to_string(), "b@y".to_string()])
                .unwrap(),
            uid: true,
        };
        assert_eq!(
            render(&cmd),
            "A0001 UID SEARCH OR (TO \"a@x\") (TO \"b@y\")\r\n"
        );
    }

    #[test]
    fn test_uid_store_flags() {
        let cmd = Command::UidStore {
            uids: UidSet::single(Uid::new(7).unwrap()),
            action: StoreAction::AddFlags(vec![Flag::Deleted]),
        };
        assert_eq!(render(&cmd), "A0001 UID STORE 7 +FLAGS (\\Deleted)\r\n");
    }

    #[test]
    fn test_expunge_and_logout() {
        assert_eq!(render(&Command::Expunge), "A0001 EXPUNGE\r\n");
        assert_eq!(render(&Command::Logout), "A0001 LOGOUT\r\n");
    }
}
