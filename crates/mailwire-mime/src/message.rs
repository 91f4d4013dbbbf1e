//! Transfer-encoding decode and multipart decomposition.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses a transfer encoding from a header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Decodes a body according to its transfer encoding.
///
/// Decoding is lenient: if the data does not decode cleanly it is returned
/// unchanged, since mail servers routinely mislabel encodings.
#[must_use]
pub fn decode_body(raw: &str, encoding: TransferEncoding) -> String {
    match encoding {
        TransferEncoding::Base64 => decode_base64(raw)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_else(|_| raw.to_string()),
        TransferEncoding::QuotedPrintable => {
            decode_quoted_printable(raw).unwrap_or_else(|_| raw.to_string())
        }
        _ => raw.to_string(),
    }
}

/// Text and HTML representations extracted from a message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyContent {
    /// Plain-text representation, if present.
    pub text: Option<String>,
    /// HTML representation, if present.
    pub html: Option<String>,
}

/// Decomposes a multipart body into its text and HTML representations.
///
/// Splits the raw text on `--boundary` markers, decodes each part per its
/// own `Content-Transfer-Encoding`, and recurses into nested multipart
/// parts (the `multipart/alternative` inside a `multipart/mixed` message).
/// Attachment parts and non-text media are skipped. The first part of each
/// kind wins.
#[must_use]
pub fn parse_multipart(raw: &str, boundary: &str) -> BodyContent {
    let mut content = BodyContent::default();
    collect_parts(raw, boundary, &mut content);
    content
}

fn collect_parts(raw: &str, boundary: &str, content: &mut BodyContent) {
    let marker = format!("--{boundary}");

    for segment in raw.split(marker.as_str()) {
        let segment = segment
            .strip_prefix("\r\n")
            .or_else(|| segment.strip_prefix('\n'))
            .unwrap_or(segment);

        // Preamble before the first marker, epilogue after the closing
        // "--boundary--", and empty segments all fall through here.
        if segment.trim().is_empty() || segment.starts_with("--") {
            continue;
        }

        let (head, body) = split_headers(segment);
        let headers = Headers::parse(head);

        if headers
            .get("content-disposition")
            .is_some_and(|d| d.to_lowercase().starts_with("attachment"))
        {
            continue;
        }

        let content_type = headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(ContentType::text_plain);

        if content_type.is_multipart() {
            if let Some(inner) = content_type.boundary() {
                collect_parts(body, inner, content);
            }
            continue;
        }

        if !content_type.main_type.eq_ignore_ascii_case("text") {
            continue;
        }

        let encoding = headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);
        let decoded = decode_body(trim_part_body(body), encoding);

        if content_type.is_html() {
            if content.html.is_none() {
                content.html = Some(decoded);
            }
        } else if content.text.is_none() {
            content.text = Some(decoded);
        }
    }
}

/// Splits a part into its header block and body at the first blank line.
fn split_headers(segment: &str) -> (&str, &str) {
    if let Some(pos) = segment.find("\r\n\r\n") {
        (&segment[..pos], &segment[pos + 4..])
    } else if let Some(pos) = segment.find("\n\n") {
        (&segment[..pos], &segment[pos + 2..])
    } else {
        // No blank line: the segment is all headers, no body.
        (segment, "")
    }
}

/// Strips the CRLF that belongs to the following boundary marker.
fn trim_part_body(body: &str) -> &str {
    body.strip_suffix("\r\n")
        .or_else(|| body.strip_suffix('\n'))
        .unwrap_or(body)
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

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse(" quoted-printable "),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(
            TransferEncoding::parse("x-unknown"),
            TransferEncoding::SevenBit
        );
    }

    #[test]
    fn test_decode_body_base64() {
        assert_eq!(
            decode_body("SGVsbG8=", TransferEncoding::Base64),
            "Hello"
        );
    }

    #[test]
    fn test_decode_body_lenient_on_garbage() {
        assert_eq!(
            decode_body("not base64!!!", TransferEncoding::Base64),
            "not base64!!!"
        );
    }

    #[test]
    fn test_parse_multipart_alternative() {
        let raw = concat!(
            "--b1\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "plain H=C3=A9llo\r\n",
            "--b1\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>html</p>\r\n",
            "--b1--\r\n"
        );

        let content = parse_multipart(raw, "b1");
        assert_eq!(content.text.as_deref(), Some("plain Héllo"));
        assert_eq!(content.html.as_deref(), Some("<p>html</p>"));
    }

    #[test]
    fn test_parse_multipart_nested_alternative_in_mixed() {
        let raw = concat!(
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=inner\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "the text\r\n",
            "--inner\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<b>the html</b>\r\n",
            "--inner--\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf\r\n",
            "Content-Disposition: attachment; filename=\"doc.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0=\r\n",
            "--outer--\r\n"
        );

        let content = parse_multipart(raw, "outer");
        assert_eq!(content.text.as_deref(), Some("the text"));
        assert_eq!(content.html.as_deref(), Some("<b>the html</b>"));
    }

    #[test]
    fn test_parse_multipart_part_without_content_type_defaults_to_text() {
        let raw = "--b\r\n\r\nimplicit plain\r\n--b--\r\n";
        let content = parse_multipart(raw, "b");
        assert_eq!(content.text.as_deref(), Some("implicit plain"));
        assert!(content.html.is_none());
    }

    #[test]
    fn test_parse_multipart_first_part_wins() {
        let raw = concat!(
            "--b\r\nContent-Type: text/plain\r\n\r\nfirst\r\n",
            "--b\r\nContent-Type: text/plain\r\n\r\nsecond\r\n",
            "--b--\r\n"
        );
        let content = parse_multipart(raw, "b");
        assert_eq!(content.text.as_deref(), Some("first"));
    }

    #[test]
    fn test_parse_multipart_lf_only_blank_line() {
        let raw = "--b\nContent-Type: text/plain\n\nunix body\n--b--\n";
        let content = parse_multipart(raw, "b");
        assert_eq!(content.text.as_deref(), Some("unix body"));
    }
}
