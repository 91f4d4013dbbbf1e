//! # mailwire-smtp
//!
//! A line-oriented SMTP client implementing the submission subset of
//! RFC 5321 used by the mailwire notification core.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of the
//!   handshake order (`Connected` → `Authenticated`)
//! - **Protocol support**: EHLO, STARTTLS, AUTH LOGIN, MAIL FROM, RCPT TO,
//!   DATA, RSET, QUIT
//! - **TLS support**: Both implicit TLS (port 465) and opportunistic
//!   STARTTLS upgrade, via rustls
//! - **Batch sending**: One authenticated connection reused across a batch,
//!   with per-message failure isolation
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailwire_mime::OutgoingMessage;
//! use mailwire_smtp::{Mailer, MailerConfig, Security};
//!
//! #[tokio::main]
//! async fn main() -> mailwire_smtp::Result<()> {
//!     let config = MailerConfig::new("smtp.example.com", Security::Implicit)
//!         .credentials("user@example.com", "password")
//!         .sender("Notifications <noreply@example.com>");
//!
//!     let mailer = Mailer::new(config);
//!     let message = OutgoingMessage::new("Status changed")
//!         .to("customer@example.com")
//!         .text("Your ticket was updated.");
//!
//!     let result = mailer.send(&message).await?;
//!     assert!(result.success);
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐                ┌─────────────────┐
//! │  Connected   │ ─ ehlo() ────→ │ Connected(EHLO) │ ─ auth_login() ─→ Authenticated
//! └──────────────┘   starttls()   └─────────────────┘                   send_mail()*
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command serialization
//! - [`connection`]: Streams, type-state client, and the [`Mailer`] wrapper
//! - [`parser`]: Incremental reply framer and reply parsing
//! - [`types`]: Replies, reply codes, addresses

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authenticated, Client, Connected, Mailer, MailerConfig, Security, SendResult, ServerInfo,
    SmtpStream, submit_batch,
};
pub use error::{Error, Result};
pub use types::{Address, Reply, ReplyCode};
