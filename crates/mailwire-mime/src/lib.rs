//! # mailwire-mime
//!
//! MIME message building and decoding for email transfer.
//!
//! ## Features
//!
//! - **Message building**: Serialize an [`OutgoingMessage`] into RFC 5322
//!   wire form, with `multipart/mixed` and `multipart/alternative` layouts,
//!   quoted-printable text parts, and base64 attachments
//! - **Message decoding**: Split multipart bodies, honor
//!   `Content-Transfer-Encoding`, unfold and decode headers
//! - **Encodings**: Base64, Quoted-Printable, RFC 2047 encoded-words
//!
//! ## Quick Start
//!
//! ```
//! use mailwire_mime::{Attachment, OutgoingMessage};
//!
//! let message = OutgoingMessage::new("Weekly report")
//!     .to("team@example.com")
//!     .text("Numbers attached.")
//!     .html("<p>Numbers attached.</p>")
//!     .attach(Attachment::new("report.csv", "text/csv", b"a,b\n1,2\n".to_vec()));
//!
//! let built = message.build("sender@example.com", "example.com");
//! assert!(built.message_id.ends_with("@example.com>"));
//! ```
//!
//! ## Modules
//!
//! - [`builder`]: Outgoing message types and serialization
//! - [`content_type`]: Content-Type parsing and rendering
//! - [`encoding`]: Base64 / Quoted-Printable / RFC 2047
//! - [`header`]: Header map with RFC 5322 unfolding
//! - [`message`]: Transfer-encoding decode and multipart decomposition

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod content_type;
pub mod encoding;
mod error;
pub mod header;
pub mod message;

pub use builder::{Attachment, BuiltMessage, OutgoingMessage};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{BodyContent, TransferEncoding, decode_body, parse_multipart};
