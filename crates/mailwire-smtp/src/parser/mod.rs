//! SMTP reply framing and parsing.
//!
//! [`ReplyBuffer`] is the incremental framer: it is fed raw socket chunks
//! and yields one complete reply at a time, so framing is testable without
//! a socket. A reply is complete when the newest complete line carries a
//! three-digit code followed by a space; continuation lines use `-` as the
//! separator (`250-first`, `250 last`).

use bytes::BytesMut;

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Maximum length of a single reply line, to bound a misbehaving server.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MiB

/// Incremental reply framer.
///
/// Bytes go in via [`ReplyBuffer::extend`]; [`ReplyBuffer::try_next`]
/// returns the lines of the next complete reply, consuming exactly those
/// bytes. Partial replies stay buffered untouched until more data arrives.
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    buf: BytesMut,
}

impl ReplyBuffer {
    /// Creates an empty reply buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes read from the socket.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Attempts to extract the next complete reply.
    ///
    /// Returns `Ok(None)` when the buffered data does not yet contain the
    /// final line of a reply.
    ///
    /// # Errors
    ///
    /// Returns an error if a line exceeds the length bound.
    pub fn try_next(&mut self) -> Result<Option<Vec<String>>> {
        let mut offset = 0;

        loop {
            let Some(pos) = find_crlf(&self.buf[offset..]) else {
                if self.buf.len() - offset > MAX_LINE_LENGTH {
                    return Err(Error::Protocol("reply line too long".to_string()));
                }
                return Ok(None);
            };

            let line_end = offset + pos + 2;
            if is_final_reply_line(&self.buf[offset..offset + pos]) {
                let consumed = self.buf.split_to(line_end);
                let lines = consumed[..consumed.len() - 2]
                    .split(|&b| b == b'\n')
                    .map(|line| {
                        let line = line.strip_suffix(b"\r").unwrap_or(line);
                        String::from_utf8_lossy(line).into_owned()
                    })
                    .collect();
                return Ok(Some(lines));
            }

            offset = line_end;
        }
    }

    /// Returns true if no bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Checks if a line is the final line of a (possibly multi-line) reply.
///
/// Final lines are `\d{3}<space>...`; continuations are `\d{3}-...`.
#[must_use]
pub fn is_final_reply_line(line: &[u8]) -> bool {
    line.len() >= 4 && line[..3].iter().all(u8::is_ascii_digit) && line[3] == b' '
}

/// Parses an SMTP reply from its wire lines.
///
/// # Errors
///
/// Returns an error if the reply is empty or the code is malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let first = lines
        .first()
        .ok_or_else(|| Error::Protocol("Empty reply".to_string()))?;

    if first.len() < 3 {
        return Err(Error::Protocol(format!("Reply too short: {first}")));
    }

    let code = first[..3]
        .parse::<u16>()
        .map_err(|_| Error::Protocol(format!("Invalid reply code: {first}")))?;

    let mut message = Vec::with_capacity(lines.len());
    for line in lines {
        if line.len() > 4 {
            // Skip code and separator ("250-" or "250 ")
            message.push(line[4..].to_string());
        } else {
            message.push(String::new());
        }
    }

    Ok(Reply::new(ReplyCode::new(code), message))
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
    fn test_single_line_reply() {
        let mut framer = ReplyBuffer::new();
        framer.extend(b"250 OK\r\n");

        let lines = framer.try_next().unwrap().unwrap();
        assert_eq!(lines, vec!["250 OK"]);
        assert!(framer.is_empty());
    }

    #[test]
    fn test_multi_line_reply_completes_at_space_line() {
        let mut framer = ReplyBuffer::new();
        framer.extend(b"250-smtp.example.com\r\n250-STARTTLS\r\n");

        // Continuation lines alone are not a complete reply.
        assert!(framer.try_next().unwrap().is_none());

        framer.extend(b"250 SIZE 35882577\r\n");
        let lines = framer.try_next().unwrap().unwrap();
        assert_eq!(
            lines,
            vec!["250-smtp.example.com", "250-STARTTLS", "250 SIZE 35882577"]
        );
    }

    #[test]
    fn test_chunked_delivery_matches_single_chunk() {
        let wire = b"250-a\r\n250-b\r\n250 c\r\n";

        let mut whole = ReplyBuffer::new();
        whole.extend(wire);
        let expected = whole.try_next().unwrap().unwrap();

        let mut chunked = ReplyBuffer::new();
        for chunk in wire.chunks(3) {
            chunked.extend(chunk);
        }
        let got = chunked.try_next().unwrap().unwrap();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_two_replies_consumed_separately() {
        let mut framer = ReplyBuffer::new();
        framer.extend(b"220 ready\r\n250 OK\r\n");

        assert_eq!(framer.try_next().unwrap().unwrap(), vec!["220 ready"]);
        assert_eq!(framer.try_next().unwrap().unwrap(), vec!["250 OK"]);
        assert!(framer.try_next().unwrap().is_none());
    }

    #[test]
    fn test_incomplete_line_defers() {
        let mut framer = ReplyBuffer::new();
        framer.extend(b"250 O");
        assert!(framer.try_next().unwrap().is_none());

        framer.extend(b"K\r\n");
        assert_eq!(framer.try_next().unwrap().unwrap(), vec!["250 OK"]);
    }

    #[test]
    fn test_line_too_long_rejected() {
        let mut framer = ReplyBuffer::new();
        framer.extend(&vec![b'a'; MAX_LINE_LENGTH + 10]);
        assert!(framer.try_next().is_err());
    }

    #[test]
    fn test_is_final_reply_line() {
        assert!(is_final_reply_line(b"250 OK"));
        assert!(is_final_reply_line(b"354 "));
        assert!(!is_final_reply_line(b"250-Continuing"));
        assert!(!is_final_reply_line(b"250"));
        assert!(!is_final_reply_line(b"abc def"));
    }

    #[test]
    fn test_parse_single_line_reply() {
        let lines = vec!["250 OK".to_string()];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.message, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_parse_multi_line_reply() {
        let lines = vec![
            "250-First line".to_string(),
            "250-Second line".to_string(),
            "250 Last line".to_string(),
        ];
        let reply = parse_reply(&lines).unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(
            reply.message,
            vec!["First line", "Second line", "Last line"]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&["25".to_string()]).is_err());
        assert!(parse_reply(&["ABC OK".to_string()]).is_err());
    }
}
