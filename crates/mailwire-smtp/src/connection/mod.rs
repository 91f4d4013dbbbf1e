//! SMTP connection management.

mod client;
mod mailer;
mod stream;

pub use client::{Authenticated, Client, Connected, SendResult, ServerInfo};
pub use mailer::{Mailer, MailerConfig, Security, submit_batch};
pub use stream::{SmtpStream, connect_plain, connect_tls};
