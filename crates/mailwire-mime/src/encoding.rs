//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data, ignoring embedded whitespace.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Line width for wrapped Base64 bodies (RFC 2045 limit is 76).
const BASE64_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 wrapped to 76-column lines with CRLF breaks.
///
/// Used for attachment bodies in outgoing messages.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH * 2);

    for chunk in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        if !out.is_empty() {
            out.push_str("\r\n");
        }
        // Chunks of an ASCII string are valid UTF-8
        out.push_str(&String::from_utf8_lossy(chunk));
    }

    out
}

/// Soft-wrap column for Quoted-Printable encoding.
const QP_SOFT_WRAP: usize = 75;

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// CRLF (and bare LF) in the input is emitted as a real line break rather
/// than being byte-encoded, so multi-line text bodies keep their structure
/// on the wire. All other non-printable or non-ASCII bytes become `=HH`
/// escapes, one per UTF-8 byte. Lines are soft-wrapped at 75 columns with a
/// trailing `=`.
#[must_use]
#[allow(clippy::missing_panics_doc)] // write! to String cannot fail
pub fn encode_quoted_printable(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut column = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        // Hard line break: pass through and reset the column counter.
        if b == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
            out.push_str("\r\n");
            column = 0;
            i += 2;
            continue;
        }
        if b == b'\n' {
            out.push_str("\r\n");
            column = 0;
            i += 1;
            continue;
        }

        // Whitespace directly before a line break must be escaped, since
        // transport agents may strip it.
        let at_line_end = matches!(bytes.get(i + 1), None | Some(b'\r' | b'\n'));
        let literal = match b {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !at_line_end,
            _ => false,
        };

        let width = if literal { 1 } else { 3 };
        if column + width > QP_SOFT_WRAP {
            out.push_str("=\r\n");
            column = 0;
        }

        if literal {
            out.push(b as char);
        } else {
            let _ = write!(out, "={b:02X}");
        }
        column += width;
        i += 1;
    }

    out
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// Soft line breaks (`=` followed by CRLF or LF) are removed; `=HH` escapes
/// are expanded.
///
/// # Errors
///
/// Returns an error on a truncated or non-hex escape sequence, or if the
/// decoded bytes are not valid UTF-8.
pub fn decode_quoted_printable(text: &str) -> Result<String> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'=' {
            // Soft line break
            if bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n') {
                i += 3;
                continue;
            }
            if bytes.get(i + 1) == Some(&b'\n') {
                i += 2;
                continue;
            }

            let hex = bytes.get(i + 1..i + 3).ok_or_else(|| {
                Error::InvalidEncoding("Incomplete escape sequence".to_string())
            })?;
            let hex = std::str::from_utf8(hex)
                .map_err(|_| Error::InvalidEncoding("Non-ASCII escape sequence".to_string()))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(Into::into)
}

/// Encodes a header value as an RFC 2047 encoded-word if necessary.
///
/// Pure ASCII values without `=?` markers pass through unchanged; anything
/// else becomes `=?charset?B?base64?=`.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    if text.is_ascii() && !text.contains("=?") {
        return text.to_string();
    }

    let encoded = encode_base64(text.as_bytes());
    format!("=?{charset}?B?{encoded}?=")
}

/// Decodes RFC 2047 encoded-words embedded in a header value.
///
/// Handles `B` (Base64) and `Q` (Quoted-Printable with `_` for space)
/// encodings. Decoding is lenient: malformed encoded-words are left in
/// place rather than failing the whole header.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("=?") {
        let Some(end) = rest[start + 2..].find("?=").map(|p| start + 2 + p + 2) else {
            break;
        };

        out.push_str(&rest[..start]);
        let word = &rest[start..end];
        match decode_encoded_word(word) {
            Some(decoded) => out.push_str(&decoded),
            None => out.push_str(word),
        }
        rest = &rest[end..];

        // Whitespace between adjacent encoded-words is not significant.
        let trimmed = rest.trim_start();
        if trimmed.starts_with("=?") && trimmed.len() != rest.len() {
            rest = trimmed;
        }
    }

    out.push_str(rest);
    out
}

/// Decodes a single `=?charset?enc?data?=` token.
fn decode_encoded_word(word: &str) -> Option<String> {
    let inner = word.strip_prefix("=?")?.strip_suffix("?=")?;
    let mut parts = inner.splitn(3, '?');
    let _charset = parts.next()?;
    let encoding = parts.next()?;
    let data = parts.next()?;

    match encoding {
        "B" | "b" => {
            let decoded = decode_base64(data).ok()?;
            String::from_utf8(decoded).ok()
        }
        "Q" | "q" => {
            let with_spaces = data.replace('_', " ");
            decode_quoted_printable(&with_spaces).ok()
        }
        _ => None,
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_decode_with_line_breaks() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==\r\n");
        assert_eq!(decoded.unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_base64_wrapped_line_length() {
        let data = vec![0xAB_u8; 200];
        let wrapped = encode_base64_wrapped(&data);
        for line in wrapped.split("\r\n") {
            assert!(line.len() <= 76);
            assert!(!line.is_empty());
        }
        assert_eq!(decode_base64(&wrapped).unwrap(), data);
    }

    #[test]
    fn test_quoted_printable_ascii_passthrough() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_quoted_printable_non_ascii() {
        let encoded = encode_quoted_printable("Héllo");
        assert_eq!(encoded, "H=C3=A9llo");
    }

    #[test]
    fn test_quoted_printable_preserves_crlf() {
        let encoded = encode_quoted_printable("line one\r\nline two");
        assert_eq!(encoded, "line one\r\nline two");

        // Bare LF is normalized to CRLF
        let encoded = encode_quoted_printable("line one\nline two");
        assert_eq!(encoded, "line one\r\nline two");
    }

    #[test]
    fn test_quoted_printable_trailing_space_escaped() {
        let encoded = encode_quoted_printable("trailing \r\nnext");
        assert_eq!(encoded, "trailing=20\r\nnext");
    }

    #[test]
    fn test_quoted_printable_soft_wrap() {
        let long = "a".repeat(100);
        let encoded = encode_quoted_printable(&long);
        assert!(encoded.contains("=\r\n"));
        for line in encoded.split("\r\n") {
            assert!(line.len() <= 76);
        }
        assert_eq!(decode_quoted_printable(&encoded).unwrap(), long);
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(
            decode_quoted_printable("H=C3=A9llo").unwrap(),
            "Héllo"
        );
        assert_eq!(
            decode_quoted_printable("Hello=\r\nWorld").unwrap(),
            "HelloWorld"
        );
        assert_eq!(
            decode_quoted_printable("Hello=\nWorld").unwrap(),
            "HelloWorld"
        );
    }

    #[test]
    fn test_quoted_printable_decode_truncated_escape() {
        assert!(decode_quoted_printable("abc=4").is_err());
        assert!(decode_quoted_printable("abc=ZZ").is_err());
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(encoded.ends_with("?="));
        assert_eq!(decode_rfc2047(&encoded), "Héllo");
    }

    #[test]
    fn test_rfc2047_decode_base64() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_rfc2047_decode_quoted_printable() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?="), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?Q?one_two?="), "one two");
    }

    #[test]
    fn test_rfc2047_decode_embedded() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?B?SMOpbGxv?= again"),
            "Re: Héllo again"
        );
    }

    #[test]
    fn test_rfc2047_decode_adjacent_words() {
        assert_eq!(
            decode_rfc2047("=?utf-8?B?SMOp?= =?utf-8?B?bGxv?="),
            "Héllo"
        );
    }

    #[test]
    fn test_rfc2047_decode_malformed_left_alone() {
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047("plain text"), "plain text");
    }

    proptest! {
        #[test]
        fn quoted_printable_roundtrip(s in "\\PC{0,200}") {
            let encoded = encode_quoted_printable(&s);
            prop_assert_eq!(decode_quoted_printable(&encoded).unwrap(), s);
        }

        #[test]
        fn base64_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode_base64_wrapped(&data);
            prop_assert_eq!(decode_base64(&encoded).unwrap(), data);
        }

        #[test]
        fn rfc2047_roundtrip(s in "\\PC{0,80}") {
            let encoded = encode_rfc2047(&s, "utf-8");
            prop_assert_eq!(decode_rfc2047(&encoded), s);
        }
    }
}
