//! Outgoing message types and RFC 5322 serialization.

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_wrapped, encode_quoted_printable, encode_rfc2047};
use std::fmt::Write as _;

/// A file attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// MIME type of the content (e.g., "application/pdf").
    pub content_type: String,
    /// Raw content bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Creates a new attachment.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// An email message to send.
///
/// Built by the caller, serialized by [`OutgoingMessage::build`], and
/// submitted through the SMTP client. The message itself is never persisted.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    /// Sender in display form (`Name <addr>` or bare address). When absent,
    /// the transport's configured sender is used.
    pub from: Option<String>,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// CC addresses.
    pub cc: Vec<String>,
    /// BCC addresses (receive the message but are not listed in headers).
    pub bcc: Vec<String>,
    /// Reply-To address.
    pub reply_to: Option<String>,
    /// In-Reply-To message id (threading).
    pub in_reply_to: Option<String>,
    /// References header (threading).
    pub references: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// Attachments.
    pub attachments: Vec<Attachment>,
    /// Additional custom headers.
    pub headers: Vec<(String, String)>,
}

impl OutgoingMessage {
    /// Creates a new message with the given subject.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Self::default()
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn from(mut self, sender: impl Into<String>) -> Self {
        self.from = Some(sender.into());
        self
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds a CC recipient.
    #[must_use]
    pub fn cc(mut self, recipient: impl Into<String>) -> Self {
        self.cc.push(recipient.into());
        self
    }

    /// Adds a BCC recipient.
    #[must_use]
    pub fn bcc(mut self, recipient: impl Into<String>) -> Self {
        self.bcc.push(recipient.into());
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Adds a custom header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns all envelope recipients (to, cc, bcc flattened).
    #[must_use]
    pub fn all_recipients(&self) -> Vec<&str> {
        self.to
            .iter()
            .chain(&self.cc)
            .chain(&self.bcc)
            .map(String::as_str)
            .collect()
    }

    /// Serializes the message into RFC 5322 wire form.
    ///
    /// `fallback_from` is used when the message has no explicit sender;
    /// `domain` feeds the locally generated Message-ID. The body layout
    /// depends on what the message carries: attachments produce a
    /// `multipart/mixed` envelope (with a nested `multipart/alternative`
    /// when both text and HTML are present), text plus HTML alone produce
    /// `multipart/alternative`, and a single representation is emitted as
    /// one `text/*` part.
    #[must_use]
    pub fn build(&self, fallback_from: &str, domain: &str) -> BuiltMessage {
        let message_id = generate_message_id(domain);
        let mut out = String::new();

        let _ = write!(out, "Message-ID: {message_id}\r\n");
        let _ = write!(
            out,
            "Date: {}\r\n",
            chrono::Utc::now().format("%a, %d %b %Y %H:%M:%S +0000")
        );
        let _ = write!(
            out,
            "From: {}\r\n",
            self.from.as_deref().unwrap_or(fallback_from)
        );
        if !self.to.is_empty() {
            let _ = write!(out, "To: {}\r\n", self.to.join(", "));
        }
        if !self.cc.is_empty() {
            let _ = write!(out, "Cc: {}\r\n", self.cc.join(", "));
        }
        if let Some(reply_to) = &self.reply_to {
            let _ = write!(out, "Reply-To: {reply_to}\r\n");
        }
        if let Some(in_reply_to) = &self.in_reply_to {
            let _ = write!(out, "In-Reply-To: {in_reply_to}\r\n");
        }
        if let Some(references) = &self.references {
            let _ = write!(out, "References: {references}\r\n");
        }
        let _ = write!(
            out,
            "Subject: {}\r\n",
            encode_rfc2047(&self.subject, "utf-8")
        );
        for (name, value) in &self.headers {
            let _ = write!(out, "{name}: {value}\r\n");
        }
        out.push_str("MIME-Version: 1.0\r\n");

        self.write_body(&mut out);

        BuiltMessage {
            message_id,
            bytes: out.into_bytes(),
        }
    }

    fn write_body(&self, out: &mut String) {
        if self.attachments.is_empty() {
            match (&self.text, &self.html) {
                (Some(text), Some(html)) => {
                    let boundary = generate_boundary();
                    let _ = write!(
                        out,
                        "Content-Type: {}\r\n\r\n",
                        ContentType::multipart_alternative(&boundary)
                    );
                    write_alternative(out, &boundary, text, html);
                }
                _ => self.write_best_part(out),
            }
            return;
        }

        let mixed_boundary = generate_boundary();
        let _ = write!(
            out,
            "Content-Type: {}\r\n\r\n",
            ContentType::multipart_mixed(&mixed_boundary)
        );

        let _ = write!(out, "--{mixed_boundary}\r\n");
        match (&self.text, &self.html) {
            (Some(text), Some(html)) => {
                let alt_boundary = generate_boundary();
                let _ = write!(
                    out,
                    "Content-Type: {}\r\n\r\n",
                    ContentType::multipart_alternative(&alt_boundary)
                );
                write_alternative(out, &alt_boundary, text, html);
            }
            _ => self.write_best_part(out),
        }

        for attachment in &self.attachments {
            let _ = write!(out, "\r\n--{mixed_boundary}\r\n");
            write_attachment(out, attachment);
        }
        let _ = write!(out, "\r\n--{mixed_boundary}--\r\n");
    }

    /// Writes the single best body representation (HTML preferred).
    fn write_best_part(&self, out: &mut String) {
        if let Some(html) = &self.html {
            write_text_part(out, &ContentType::text_html(), html);
        } else {
            write_text_part(
                out,
                &ContentType::text_plain(),
                self.text.as_deref().unwrap_or(""),
            );
        }
    }
}

/// A serialized message ready for SMTP DATA.
#[derive(Debug, Clone)]
pub struct BuiltMessage {
    /// The locally generated Message-ID, including angle brackets.
    pub message_id: String,
    /// RFC 5322 bytes (headers + body, CRLF line endings).
    pub bytes: Vec<u8>,
}

fn write_alternative(out: &mut String, boundary: &str, text: &str, html: &str) {
    let _ = write!(out, "--{boundary}\r\n");
    write_text_part(out, &ContentType::text_plain(), text);
    let _ = write!(out, "\r\n--{boundary}\r\n");
    write_text_part(out, &ContentType::text_html(), html);
    let _ = write!(out, "\r\n--{boundary}--\r\n");
}

// Part bodies carry no trailing CRLF; the boundary separators written by
// the callers provide it.
fn write_text_part(out: &mut String, content_type: &ContentType, body: &str) {
    let _ = write!(out, "Content-Type: {content_type}\r\n");
    out.push_str("Content-Transfer-Encoding: quoted-printable\r\n\r\n");
    out.push_str(&encode_quoted_printable(body));
}

fn write_attachment(out: &mut String, attachment: &Attachment) {
    let _ = write!(
        out,
        "Content-Type: {}; name=\"{}\"\r\n",
        attachment.content_type, attachment.filename
    );
    out.push_str("Content-Transfer-Encoding: base64\r\n");
    let _ = write!(
        out,
        "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
        attachment.filename
    );
    out.push_str(&encode_base64_wrapped(&attachment.data));
}

/// Generates a Message-ID of the form `<hex128@domain>`.
fn generate_message_id(domain: &str) -> String {
    format!(
        "<{:016x}{:016x}@{}>",
        rand::random::<u64>(),
        rand::random::<u64>(),
        domain
    )
}

/// Generates a MIME boundary unlikely to collide with body content.
fn generate_boundary() -> String {
    format!("----=_mailwire_{:016x}", rand::random::<u64>())
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
    use crate::encoding::decode_base64;
    use crate::header::Headers;
    use crate::message::parse_multipart;

    fn built_as_text(message: &OutgoingMessage) -> String {
        let built = message.build("noreply@example.com", "example.com");
        String::from_utf8(built.bytes).unwrap()
    }

    #[test]
    fn test_plain_text_only() {
        let message = OutgoingMessage::new("Hi")
            .to("a@example.com")
            .text("hello");
        let raw = built_as_text(&message);

        assert!(raw.contains("From: noreply@example.com\r\n"));
        assert!(raw.contains("To: a@example.com\r\n"));
        assert!(raw.contains("Subject: Hi\r\n"));
        assert!(raw.contains("MIME-Version: 1.0\r\n"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(raw.contains("\r\n\r\nhello"));
        assert!(!raw.contains("multipart"));
    }

    #[test]
    fn test_html_preferred_when_no_text() {
        let message = OutgoingMessage::new("Hi")
            .to("a@example.com")
            .html("<p>hello</p>");
        let raw = built_as_text(&message);

        assert!(raw.contains("Content-Type: text/html; charset=utf-8\r\n"));
    }

    #[test]
    fn test_text_and_html_builds_alternative() {
        let message = OutgoingMessage::new("Hi")
            .to("a@example.com")
            .text("plain")
            .html("<p>rich</p>");
        let raw = built_as_text(&message);

        assert!(raw.contains("Content-Type: multipart/alternative;"));
        let headers = Headers::parse(&raw);
        let ct = ContentType::parse(headers.get("content-type").unwrap()).unwrap();
        let body_start = raw.find("\r\n\r\n").unwrap() + 4;
        let content = parse_multipart(&raw[body_start..], ct.boundary().unwrap());
        assert_eq!(content.text.as_deref(), Some("plain"));
        assert_eq!(content.html.as_deref(), Some("<p>rich</p>"));
    }

    #[test]
    fn test_attachment_builds_mixed_with_nested_alternative() {
        let payload = "col1,col2\r\nv1,v2\r\n";
        let message = OutgoingMessage::new("Report")
            .to("a@example.com")
            .text("see attached")
            .html("<p>see attached</p>")
            .attach(Attachment::new("r.csv", "text/csv", payload.as_bytes().to_vec()));
        let raw = built_as_text(&message);

        assert!(raw.contains("Content-Type: multipart/mixed;"));
        assert!(raw.contains("Content-Type: multipart/alternative;"));
        assert!(raw.contains("Content-Disposition: attachment; filename=\"r.csv\"\r\n"));

        // Round-trip the attachment bytes through our own decoder.
        let b64_start = raw.find("base64\r\nContent-Disposition").unwrap();
        let blank = raw[b64_start..].find("\r\n\r\n").unwrap() + b64_start + 4;
        let end = raw[blank..].find("\r\n--").unwrap() + blank;
        assert_eq!(decode_base64(&raw[blank..end]).unwrap(), payload.as_bytes());

        // And the bodies through the multipart parser.
        let headers = Headers::parse(&raw);
        let ct = ContentType::parse(headers.get("content-type").unwrap()).unwrap();
        let body_start = raw.find("\r\n\r\n").unwrap() + 4;
        let content = parse_multipart(&raw[body_start..], ct.boundary().unwrap());
        assert_eq!(content.text.as_deref(), Some("see attached"));
        assert_eq!(content.html.as_deref(), Some("<p>see attached</p>"));
    }

    #[test]
    fn test_non_ascii_subject_encoded() {
        let message = OutgoingMessage::new("Héllo wörld").to("a@example.com");
        let raw = built_as_text(&message);

        assert!(raw.contains("Subject: =?utf-8?B?"));
        let headers = Headers::parse_decoded(&raw);
        assert_eq!(headers.get("subject"), Some("Héllo wörld"));
    }

    #[test]
    fn test_message_id_format() {
        let built = OutgoingMessage::new("x").build("a@b.c", "b.c");
        assert!(built.message_id.starts_with('<'));
        assert!(built.message_id.ends_with("@b.c>"));
    }

    #[test]
    fn test_threading_and_custom_headers() {
        let message = OutgoingMessage::new("Re: ticket")
            .to("a@example.com")
            .header("X-Ticket-ID", "4711");
        let mut message = message;
        message.in_reply_to = Some("<parent@example.com>".to_string());
        message.references = Some("<root@example.com> <parent@example.com>".to_string());

        let raw = built_as_text(&message);
        assert!(raw.contains("In-Reply-To: <parent@example.com>\r\n"));
        assert!(raw.contains("References: <root@example.com> <parent@example.com>\r\n"));
        assert!(raw.contains("X-Ticket-ID: 4711\r\n"));
    }

    #[test]
    fn test_all_recipients_flattened() {
        let message = OutgoingMessage::new("x")
            .to("a@x")
            .cc("b@y")
            .bcc("c@z");
        assert_eq!(message.all_recipients(), vec!["a@x", "b@y", "c@z"]);
    }

    #[test]
    fn test_bcc_not_in_headers() {
        let message = OutgoingMessage::new("x").to("a@x").bcc("hidden@z");
        let raw = built_as_text(&message);
        assert!(!raw.contains("hidden@z"));
    }

    #[test]
    fn test_multibyte_at_wrap_boundary_roundtrip() {
        // Force multi-byte escapes to straddle the soft-wrap column.
        let body = "é".repeat(60);
        let message = OutgoingMessage::new("x").to("a@x").text(&body);
        let raw = built_as_text(&message);

        let body_start = raw.find("\r\n\r\n").unwrap() + 4;
        let decoded =
            crate::encoding::decode_quoted_printable(raw[body_start..].trim_end()).unwrap();
        assert_eq!(decoded, body);
    }
}
