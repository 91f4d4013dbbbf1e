//! # mailwire-client
//!
//! Product-facing mail operations for mailwire: environment-configured
//! notification sending over SMTP and inbox reading over IMAP.
//!
//! This crate is the boundary the rest of the application talks to; the
//! wire protocols live in [`mailwire_smtp`] and [`mailwire_imap`], message
//! serialization in [`mailwire_mime`].
//!
//! ## Sending
//!
//! ```ignore
//! use mailwire_client::SmtpClient;
//! use mailwire_mime::OutgoingMessage;
//!
//! let client = SmtpClient::from_env()?;
//! let results = client
//!     .send_batch(&[
//!         OutgoingMessage::new("Ticket updated")
//!             .to("customer@example.com")
//!             .text("Your ticket was updated."),
//!     ])
//!     .await;
//! assert!(results[0].success);
//! ```
//!
//! ## Reading
//!
//! ```ignore
//! use mailwire_client::InboxClient;
//!
//! let inbox = InboxClient::from_env()?;
//! let page = inbox.fetch_emails("INBOX", 0, 20, None).await?;
//! println!("{} of {} messages", page.headers.len(), page.total);
//!
//! let body = inbox.email_body("INBOX", page.headers[0].uid).await?;
//! println!("{}", body.text.unwrap_or_default());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod inbox;
pub mod sender;

pub use config::{ImapSettings, SmtpSettings};
pub use error::{Error, Result};
pub use inbox::{EmailBody, EmailPage, EmailSummary, EnvelopeSummary, InboxClient};
pub use sender::SmtpClient;

// The message and result types callers handle directly.
pub use mailwire_mime::{Attachment, OutgoingMessage};
pub use mailwire_smtp::SendResult;
