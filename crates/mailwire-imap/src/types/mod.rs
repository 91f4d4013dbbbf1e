//! Core IMAP types.
//!
//! Fundamental types used throughout the IMAP library, following RFC 3501
//! (`IMAP4rev1`) and RFC 9051 (`IMAP4rev2`).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{ListEntry, Mailbox, MailboxAttribute, MailboxInfo};
pub use response_code::ResponseCode;
pub use sequence::{SequenceSet, UidSet};
