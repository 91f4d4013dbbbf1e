//! Inbox reading over IMAP.
//!
//! Every operation opens its own connection, authenticates (with
//! opportunistic STARTTLS in plaintext mode), runs, and disconnects.
//! There is no pooling and no reconnection: a failed connection is simply
//! dropped, which closes the socket before the error propagates.

use mailwire_imap::connection::{connect_plain, connect_tls};
use mailwire_imap::{
    Authenticated, Client, ImapStream, MessageHeader, NotAuthenticated, Security, Selected, Uid,
};
use mailwire_mime::{BodyContent, ContentType, Headers, TransferEncoding, decode_body, parse_multipart};

use crate::config::ImapSettings;
use crate::error::{Error, Result};

/// One page of header summaries plus the mailbox/search total.
#[derive(Debug, Clone)]
pub struct EmailPage {
    /// Header summaries, newest first.
    pub headers: Vec<EmailSummary>,
    /// Total matching messages (mailbox size, or match count when a
    /// recipient filter is active).
    pub total: u32,
}

/// Read-only projection of one message's header data.
#[derive(Debug, Clone)]
pub struct EmailSummary {
    /// Unique identifier within the mailbox.
    pub uid: u32,
    /// Raw flag strings (`\Seen`, `\Flagged`, keywords).
    pub flags: Vec<String>,
    /// Whether the message has been read.
    pub seen: bool,
    /// Message size in bytes.
    pub size: u32,
    /// Envelope projection.
    pub envelope: EnvelopeSummary,
}

/// Decoded envelope fields.
#[derive(Debug, Clone)]
pub struct EnvelopeSummary {
    /// Date header text.
    pub date: String,
    /// Decoded subject; `(No Subject)` when absent.
    pub subject: String,
    /// From addresses as `mailbox@host`.
    pub from: Vec<String>,
    /// To addresses.
    pub to: Vec<String>,
    /// Cc addresses.
    pub cc: Vec<String>,
    /// Reply-To addresses.
    pub reply_to: Vec<String>,
    /// Message-ID header.
    pub message_id: String,
}

/// One message's body, parsed on demand.
#[derive(Debug, Clone)]
pub struct EmailBody {
    /// Unique identifier within the mailbox.
    pub uid: u32,
    /// Plain-text representation, if present.
    pub text: Option<String>,
    /// HTML representation, if present.
    pub html: Option<String>,
    /// Unfolded, RFC 2047-decoded headers.
    pub headers: Headers,
}

/// Environment-configured IMAP client for the inbox-reading feature.
pub struct InboxClient {
    settings: ImapSettings,
}

impl InboxClient {
    /// Builds a client from `IMAP_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ImapSettings::from_env()?))
    }

    /// Builds a client from explicit settings.
    #[must_use]
    pub const fn new(settings: ImapSettings) -> Self {
        Self { settings }
    }

    /// Lists all mailbox names.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting or listing fails.
    pub async fn list_mailboxes(&self) -> Result<Vec<String>> {
        let mut client = self.connect().await?;

        let result = client.list("", "*").await;
        client.logout().await;

        Ok(result?
            .into_iter()
            .map(|entry| entry.mailbox.0)
            .collect())
    }

    /// Fetches a page of message headers, newest first.
    ///
    /// `start` is an offset from the newest message. With
    /// `allowed_recipients`, the page is computed over a recipient search
    /// (UID-based pagination over the descending match list); otherwise it
    /// maps directly onto sequence numbers.
    ///
    /// # Errors
    ///
    /// Returns an error if any protocol step fails.
    pub async fn fetch_emails(
        &self,
        mailbox: &str,
        start: u32,
        count: u32,
        allowed_recipients: Option<&[String]>,
    ) -> Result<EmailPage> {
        let client = self.connect().await?;
        let mut client = client.select(mailbox).await?;

        let result = match allowed_recipients.filter(|r| !r.is_empty()) {
            Some(recipients) => Self::fetch_filtered(&mut client, recipients, start, count).await,
            None => Self::fetch_sequential(&mut client, start, count).await,
        };

        client.logout().await;
        result
    }

    /// Fetches and decodes one message body.
    ///
    /// # Errors
    ///
    /// Returns an error if `uid` is zero or a protocol step fails.
    pub async fn email_body(&self, mailbox: &str, uid: u32) -> Result<EmailBody> {
        let uid = parse_uid(uid)?;
        let client = self.connect().await?;
        let mut client = client.select(mailbox).await?;

        let result = client.fetch_body_sections(uid).await;
        client.logout().await;
        let sections = result?;

        let headers = sections
            .header
            .as_deref()
            .map(|raw| Headers::parse_decoded(&String::from_utf8_lossy(raw)))
            .unwrap_or_default();

        let content = sections.text.as_deref().map_or_else(BodyContent::default, |raw| {
            decode_text_section(&String::from_utf8_lossy(raw), &headers)
        });

        Ok(EmailBody {
            uid: uid.get(),
            text: content.text,
            html: content.html,
            headers,
        })
    }

    /// Marks a message as read.
    ///
    /// # Errors
    ///
    /// Returns an error if `uid` is zero or a protocol step fails.
    pub async fn mark_read(&self, mailbox: &str, uid: u32) -> Result<()> {
        let uid = parse_uid(uid)?;
        let client = self.connect().await?;
        let mut client = client.select(mailbox).await?;

        let result = client.mark_read(uid).await;
        client.logout().await;
        Ok(result?)
    }

    /// Marks a message as unread.
    ///
    /// # Errors
    ///
    /// Returns an error if `uid` is zero or a protocol step fails.
    pub async fn mark_unread(&self, mailbox: &str, uid: u32) -> Result<()> {
        let uid = parse_uid(uid)?;
        let client = self.connect().await?;
        let mut client = client.select(mailbox).await?;

        let result = client.mark_unread(uid).await;
        client.logout().await;
        Ok(result?)
    }

    /// Deletes a message (`\Deleted` + EXPUNGE).
    ///
    /// # Errors
    ///
    /// Returns an error if `uid` is zero or a protocol step fails.
    pub async fn delete_message(&self, mailbox: &str, uid: u32) -> Result<()> {
        let uid = parse_uid(uid)?;
        let client = self.connect().await?;
        let mut client = client.select(mailbox).await?;

        let result = client.delete_message(uid).await;
        client.logout().await;
        Ok(result?)
    }

    /// Sequence-based pagination over the whole mailbox.
    async fn fetch_sequential(
        client: &mut Client<ImapStream, Selected>,
        start: u32,
        count: u32,
    ) -> Result<EmailPage> {
        let total = client.info().exists;
        let headers = client.fetch_page(start, count).await?;

        Ok(EmailPage {
            headers: headers.into_iter().map(project_header).collect(),
            total,
        })
    }

    /// Recipient-filtered pagination: search, page the descending UID
    /// list, then fetch the page's headers in UID batches.
    async fn fetch_filtered(
        client: &mut Client<ImapStream, Selected>,
        recipients: &[String],
        start: u32,
        count: u32,
    ) -> Result<EmailPage> {
        let uids = client.search_recipients(recipients).await?;
        let total = u32::try_from(uids.len()).unwrap_or(u32::MAX);

        let from = (start as usize).min(uids.len());
        let to = from.saturating_add(count as usize).min(uids.len());
        let page = &uids[from..to];

        let mut headers = client.fetch_headers_by_uids(page).await?;
        // Server order within batches is arbitrary; restore newest-first.
        headers.sort_by(|a, b| b.uid.cmp(&a.uid));

        Ok(EmailPage {
            headers: headers.into_iter().map(project_header).collect(),
            total,
        })
    }

    /// Connects and authenticates per the configured security mode.
    async fn connect(&self) -> Result<Client<ImapStream, Authenticated>> {
        let settings = &self.settings;

        let stream = match settings.security {
            Security::Implicit => connect_tls(&settings.host, settings.port).await?,
            Security::StartTls | Security::None => {
                connect_plain(&settings.host, settings.port).await?
            }
        };

        tracing::debug!(host = %settings.host, tls = stream.is_tls(), "imap connected");
        let mut client =
            Client::<ImapStream, NotAuthenticated>::from_stream(stream, settings.timeout)
                .await?
                .with_debug(settings.debug);

        // Opportunistic upgrade: ask for capabilities when the greeting
        // carried none, then upgrade only when STARTTLS is advertised.
        if settings.security == Security::StartTls {
            if client.capabilities().is_empty() {
                client.capability().await?;
            }
            if client.supports_starttls() {
                client = client.starttls(&settings.host).await?;
            } else {
                tracing::warn!(host = %settings.host, "STARTTLS not advertised, continuing in plaintext");
            }
        }

        Ok(client
            .login(&settings.username, &settings.password)
            .await?)
    }
}

fn parse_uid(uid: u32) -> Result<Uid> {
    Uid::new(uid).ok_or_else(|| Error::InvalidArgument("UID must be nonzero".to_string()))
}

/// Projects a protocol-level header into the read-only summary shape,
/// decoding the subject and degrading missing fields to safe defaults.
fn project_header(header: MessageHeader) -> EmailSummary {
    let envelope = header.envelope;

    let subject = envelope
        .subject
        .as_deref()
        .map(mailwire_mime::encoding::decode_rfc2047)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "(No Subject)".to_string());

    let addresses = |list: &[mailwire_imap::Address]| -> Vec<String> {
        list.iter().filter_map(|a| a.email()).collect()
    };

    EmailSummary {
        uid: header.uid.get(),
        seen: header.flags.is_seen(),
        flags: header.flags.iter().map(ToString::to_string).collect(),
        size: header.size,
        envelope: EnvelopeSummary {
            date: envelope.date.unwrap_or_default(),
            subject,
            from: addresses(&envelope.from),
            to: addresses(&envelope.to),
            cc: addresses(&envelope.cc),
            reply_to: addresses(&envelope.reply_to),
            message_id: envelope.message_id.unwrap_or_default(),
        },
    }
}

/// Interprets the BODY[TEXT] section per the message's Content-Type:
/// multipart bodies are decomposed, HTML goes to `html`, anything else to
/// `text`, honoring the transfer encoding.
fn decode_text_section(raw: &str, headers: &Headers) -> BodyContent {
    let content_type = headers
        .get("content-type")
        .and_then(|v| ContentType::parse(v).ok())
        .unwrap_or_else(ContentType::text_plain);

    if content_type.is_multipart() {
        if let Some(boundary) = content_type.boundary() {
            return parse_multipart(raw, boundary);
        }
    }

    let encoding = headers
        .get("content-transfer-encoding")
        .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);
    let decoded = decode_body(raw, encoding);

    if content_type.is_html() {
        BodyContent {
            text: None,
            html: Some(decoded),
        }
    } else {
        BodyContent {
            text: Some(decoded),
            html: None,
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
    use mailwire_imap::types::{Flag, Flags};
    use mailwire_imap::{Envelope, Uid};

    fn header_with(subject: Option<&str>) -> MessageHeader {
        MessageHeader {
            uid: Uid::new(7).unwrap(),
            flags: Flags::from_vec(vec![Flag::Seen]),
            envelope: Envelope {
                subject: subject.map(ToString::to_string),
                from: vec![mailwire_imap::Address {
                    name: Some("Ann".to_string()),
                    adl: None,
                    mailbox: Some("ann".to_string()),
                    host: Some("x.org".to_string()),
                }],
                to: vec![mailwire_imap::Address {
                    name: None,
                    adl: None,
                    mailbox: Some("undisclosed".to_string()),
                    host: None,
                }],
                ..Envelope::default()
            },
            size: 321,
        }
    }

    #[test]
    fn project_header_decodes_subject() {
        let summary = project_header(header_with(Some("=?utf-8?B?SMOpbGxv?=")));
        assert_eq!(summary.envelope.subject, "Héllo");
        assert_eq!(summary.uid, 7);
        assert!(summary.seen);
    }

    #[test]
    fn project_header_defaults_missing_subject() {
        let summary = project_header(header_with(None));
        assert_eq!(summary.envelope.subject, "(No Subject)");
    }

    #[test]
    fn project_header_excludes_addresses_without_host() {
        let summary = project_header(header_with(Some("x")));
        assert_eq!(summary.envelope.from, vec!["ann@x.org"]);
        assert!(summary.envelope.to.is_empty());
    }

    #[test]
    fn decode_text_section_multipart() {
        let mut headers = Headers::new();
        headers.add("content-type", "multipart/alternative; boundary=b1");
        let raw = concat!(
            "--b1\r\nContent-Type: text/plain\r\n\r\nplain\r\n",
            "--b1\r\nContent-Type: text/html\r\n\r\n<p>rich</p>\r\n",
            "--b1--\r\n"
        );

        let content = decode_text_section(raw, &headers);
        assert_eq!(content.text.as_deref(), Some("plain"));
        assert_eq!(content.html.as_deref(), Some("<p>rich</p>"));
    }

    #[test]
    fn decode_text_section_quoted_printable_html() {
        let mut headers = Headers::new();
        headers.add("content-type", "text/html; charset=utf-8");
        headers.add("content-transfer-encoding", "quoted-printable");

        let content = decode_text_section("<p>H=C3=A9llo</p>", &headers);
        assert_eq!(content.html.as_deref(), Some("<p>Héllo</p>"));
        assert!(content.text.is_none());
    }

    #[test]
    fn decode_text_section_plain_default() {
        let headers = Headers::new();
        let content = decode_text_section("just text", &headers);
        assert_eq!(content.text.as_deref(), Some("just text"));
    }
}
