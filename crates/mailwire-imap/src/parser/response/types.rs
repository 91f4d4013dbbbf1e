//! Response data types.

use crate::types::{Flags, SeqNum, Uid};

/// FETCH response item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// Message flags.
    Flags(Flags),
    /// Internal date.
    InternalDate(String),
    /// RFC822 size.
    Rfc822Size(u32),
    /// Envelope.
    Envelope(Box<Envelope>),
    /// UID.
    Uid(Uid),
    /// BODY section data.
    Body {
        /// Section specifier (`HEADER`, `TEXT`, numeric parts).
        section: Option<String>,
        /// Body data; `None` when the server returned NIL.
        data: Option<Vec<u8>>,
    },
}

/// Message envelope: RFC 3501's fixed positional encoding of the key
/// header fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header, still RFC 2047-encoded.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from an envelope: the `(name adl mailbox host)` 4-tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete).
    pub adl: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Returns `mailbox@host`, or `None` unless both parts are non-empty.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (self.mailbox.as_deref(), self.host.as_deref()) {
            (Some(m), Some(h)) if !m.is_empty() && !h.is_empty() => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// One message's header summary, assembled from FETCH items.
#[derive(Debug, Clone)]
pub struct MessageHeader {
    /// Unique identifier.
    pub uid: Uid,
    /// Message flags.
    pub flags: Flags,
    /// Parsed envelope.
    pub envelope: Envelope,
    /// RFC822 size in bytes.
    pub size: u32,
}

impl MessageHeader {
    /// Assembles a header from fetch items. Returns `None` when the UID is
    /// missing (the one field nothing downstream can work without).
    #[must_use]
    pub fn from_items(items: Vec<FetchItem>) -> Option<Self> {
        let mut uid = None;
        let mut flags = Flags::new();
        let mut envelope = Envelope::default();
        let mut size = 0;

        for item in items {
            match item {
                FetchItem::Uid(u) => uid = Some(u),
                FetchItem::Flags(f) => flags = f,
                FetchItem::Envelope(e) => envelope = *e,
                FetchItem::Rfc822Size(s) => size = s,
                _ => {}
            }
        }

        Some(Self {
            uid: uid?,
            flags,
            envelope,
            size,
        })
    }
}

/// Untagged response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// OK response with optional code.
    Ok {
        /// Optional response code.
        code: Option<crate::types::ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO response.
    No {
        /// Optional response code.
        code: Option<crate::types::ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD response.
    Bad {
        /// Optional response code.
        code: Option<crate::types::ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH greeting.
    PreAuth {
        /// Optional response code.
        code: Option<crate::types::ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE response.
    Bye {
        /// Optional response code.
        code: Option<crate::types::ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY response.
    Capability(Vec<crate::types::Capability>),
    /// LIST response.
    List(crate::types::ListEntry),
    /// FLAGS response.
    Flags(Flags),
    /// EXISTS response (message count).
    Exists(u32),
    /// RECENT response.
    Recent(u32),
    /// EXPUNGE response (message removed).
    Expunge(SeqNum),
    /// FETCH response.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Fetch data items.
        items: Vec<FetchItem>,
    },
    /// SEARCH response. Numbers are sequence numbers or UIDs depending on
    /// whether the search was issued with the UID prefix.
    Search(Vec<u32>),
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
    use crate::types::Flag;

    #[test]
    fn address_email_requires_both_parts() {
        let addr = Address {
            name: Some("John".to_string()),
            adl: None,
            mailbox: Some("john".to_string()),
            host: Some("example.com".to_string()),
        };
        assert_eq!(addr.email(), Some("john@example.com".to_string()));

        let no_host = Address {
            name: None,
            adl: None,
            mailbox: Some("john".to_string()),
            host: None,
        };
        assert_eq!(no_host.email(), None);

        let empty_host = Address {
            name: None,
            adl: None,
            mailbox: Some("john".to_string()),
            host: Some(String::new()),
        };
        assert_eq!(empty_host.email(), None);
    }

    #[test]
    fn message_header_requires_uid() {
        let items = vec![
            FetchItem::Flags(Flags::from_vec(vec![Flag::Seen])),
            FetchItem::Rfc822Size(1024),
        ];
        assert!(MessageHeader::from_items(items).is_none());
    }

    #[test]
    fn message_header_assembly() {
        let items = vec![
            FetchItem::Uid(Uid::new(99).unwrap()),
            FetchItem::Flags(Flags::from_vec(vec![Flag::Seen])),
            FetchItem::Rfc822Size(2048),
        ];
        let header = MessageHeader::from_items(items).unwrap();
        assert_eq!(header.uid.get(), 99);
        assert!(header.flags.is_seen());
        assert_eq!(header.size, 2048);
    }
}
