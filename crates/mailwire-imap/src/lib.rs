//! # mailwire-imap
//!
//! A line-oriented IMAP client implementing the mailbox-reading subset of
//! RFC 3501 used by the mailwire mail-transfer core.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of
//!   valid IMAP state transitions (`NotAuthenticated` → `Authenticated` →
//!   `Selected`)
//! - **Literal-aware framing**: The response framer tracks `{n}` literals
//!   byte-exactly, so literal content that looks like line structure never
//!   confuses the scanner; the framer is sans-I/O and chunk-feedable
//! - **Recursive-descent response parsing**: Envelopes, address lists,
//!   fetch items over a token lexer
//! - **TLS via rustls**: Implicit TLS and in-band STARTTLS upgrade
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use mailwire_imap::{Client, connection::connect_tls};
//!
//! #[tokio::main]
//! async fn main() -> mailwire_imap::Result<()> {
//!     let stream = connect_tls("imap.example.com", 993).await?;
//!     let client = Client::from_stream(stream, Duration::from_secs(60)).await?;
//!     let client = client.login("user@example.com", "password").await?;
//!
//!     let mut client = client.select("INBOX").await?;
//!     println!("{} messages", client.info().exists);
//!
//!     // Ten newest headers.
//!     let headers = client.fetch_page(0, 10).await?;
//!     for header in &headers {
//!         println!("{:?}", header.envelope.subject);
//!     }
//!
//!     client.logout().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ── starttls()? ── login() ──→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ── select()/examine() ──→ Selected
//! └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: Command builders, tag generation, serialization
//! - [`connection`]: Streams, framing, and the type-state client
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (flags, mailboxes, identifiers)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems, SearchCriteria, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, BodySections, Client, CommandResponse, FramedStream, ImapStream,
    NotAuthenticated, ResponseAccumulator, ResponseBuffer, Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{
    Address, Envelope, FetchItem, MessageHeader, Response, ResponseParser, UntaggedResponse,
};
pub use types::{
    Capability, Flag, Flags, ListEntry, Mailbox, MailboxAttribute, MailboxInfo, ResponseCode,
    SeqNum, SequenceSet, Status, Tag, Uid, UidSet, UidValidity,
};
