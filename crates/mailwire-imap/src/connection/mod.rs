//! IMAP connection management.
//!
//! - Configuration (host, port, security mode)
//! - TLS/plaintext stream abstraction with STARTTLS upgrade
//! - Literal-aware framing
//! - Type-state client

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, BodySections, Client, NotAuthenticated, Selected};
pub use config::Security;
pub use framed::{CommandResponse, FramedStream, ResponseAccumulator, ResponseBuffer};
pub use stream::{ImapStream, connect_plain, connect_tls};
