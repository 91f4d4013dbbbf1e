//! Framed I/O for the IMAP protocol.
//!
//! IMAP responses are CRLF lines interleaved with literals: a line ending
//! in `{n}` is followed by exactly n raw bytes before line scanning
//! resumes, and those bytes may themselves contain CRLF or tag-lookalike
//! sequences. [`ResponseBuffer`] is the sans-I/O framer that walks this
//! structure incrementally; [`FramedStream`] drives it over a socket, and
//! [`ResponseAccumulator`] groups units into one command's worth of
//! responses.

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Default buffer size for reading.
const READ_CHUNK_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MiB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 64 * 1024 * 1024; // 64 MiB

/// Incremental, literal-aware response framer.
///
/// Raw socket bytes go in via [`ResponseBuffer::extend`];
/// [`ResponseBuffer::try_next`] yields one complete response unit at a
/// time (a line plus any embedded literals) and consumes exactly those
/// bytes. When the buffered data stops mid-line or mid-literal, it yields
/// `None` and leaves the buffer untouched, so chunked delivery assembles
/// to the same units as a single read.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    buf: BytesMut,
}

impl ResponseBuffer {
    /// Creates an empty response buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes read from the socket.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Returns true if no bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Attempts to extract the next complete response unit.
    ///
    /// Returns `Ok(None)` when more bytes are needed (incomplete line, or
    /// a declared literal longer than what has arrived).
    pub fn try_next(&mut self) -> Result<Option<Vec<u8>>> {
        let mut offset = 0;

        loop {
            let Some(pos) = find_crlf(&self.buf[offset..]) else {
                if self.buf.len() - offset > MAX_LINE_LENGTH {
                    return Err(Error::Protocol("line too long".to_string()));
                }
                return Ok(None);
            };

            let line_end = offset + pos + 2;

            if let Some(literal_len) = parse_literal_length(&self.buf[offset..line_end - 2]) {
                if literal_len > MAX_LITERAL_SIZE {
                    return Err(Error::Protocol(format!(
                        "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                // The literal's bytes are opaque: skip exactly
                // literal_len of them, then resume line scanning.
                if self.buf.len() < line_end + literal_len {
                    return Ok(None);
                }
                offset = line_end + literal_len;
            } else {
                let unit = self.buf.split_to(line_end);
                return Ok(Some(unit.to_vec()));
            }
        }
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal length from the end of a line (CRLF already stripped).
///
/// Matches `...{123}` and the non-synchronizing form `...{123+}`.
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    if !line.ends_with(b"}") {
        return None;
    }

    let open = line.iter().rposition(|&b| b == b'{')?;
    let inner = &line[open + 1..line.len() - 1];
    let digits = inner.strip_suffix(b"+").unwrap_or(inner);

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// One command's worth of responses: the tagged completion line plus the
/// untagged data units that preceded it.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    /// The tagged completion unit (`<tag> OK|NO|BAD ...`).
    pub tagged: Vec<u8>,
    /// Untagged units (`* ...`), in arrival order.
    pub untagged: Vec<Vec<u8>>,
}

/// Framed connection for the IMAP protocol.
///
/// Owns the socket and the response buffer; reads are appended to the
/// buffer and complete units handed out one at a time.
pub struct FramedStream<S> {
    stream: S,
    buffer: ResponseBuffer,
    timeout: Duration,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream with the given response timeout.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream,
            buffer: ResponseBuffer::new(),
            timeout,
        }
    }

    /// Reads one complete response unit, waiting for more bytes as needed.
    pub async fn read_unit(&mut self) -> Result<Vec<u8>> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(unit) = self.buffer.try_next()? {
                return Ok(unit);
            }

            let n = tokio::time::timeout(self.timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| Error::Timeout(self.timeout))??;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.buffer.extend(&chunk[..n]);
        }
    }

    /// Writes a command to the stream.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Returns the configured response timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Only sound between exchanges, when the buffer is drained.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Accumulates responses until the tagged completion for a command.
pub struct ResponseAccumulator {
    tag: String,
}

impl ResponseAccumulator {
    /// Creates a new response accumulator for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// Reads units until the one tagged with our tag arrives.
    ///
    /// Correlation is by strict temporal order: one command is in flight
    /// at a time, so everything before the tagged line belongs to it.
    pub async fn read_until_tagged<S>(&self, framed: &mut FramedStream<S>) -> Result<CommandResponse>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut untagged = Vec::new();

        loop {
            let unit = framed.read_unit().await?;

            let is_tagged = unit.len() > self.tag.len()
                && unit.starts_with(self.tag.as_bytes())
                && unit[self.tag.len()] == b' ';

            if is_tagged {
                return Ok(CommandResponse {
                    tagged: unit,
                    untagged,
                });
            }
            untagged.push(unit);
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

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_parse_literal_length() {
        assert_eq!(parse_literal_length(b"BODY {123}"), Some(123));
        assert_eq!(parse_literal_length(b"BODY {123+}"), Some(123));
        assert_eq!(parse_literal_length(b"{0}"), Some(0));
        assert_eq!(parse_literal_length(b"no literal"), None);
        assert_eq!(parse_literal_length(b"wrong {abc}"), None);
        assert_eq!(parse_literal_length(b"empty {}"), None);
    }

    #[test]
    fn test_simple_line_unit() {
        let mut framer = ResponseBuffer::new();
        framer.extend(b"* OK ready\r\n");

        let unit = framer.try_next().unwrap().unwrap();
        assert_eq!(unit, b"* OK ready\r\n");
        assert!(framer.is_empty());
    }

    #[test]
    fn test_unit_with_literal() {
        let mut framer = ResponseBuffer::new();
        framer.extend(b"* 1 FETCH (BODY {5}\r\nhello)\r\n");

        let unit = framer.try_next().unwrap().unwrap();
        assert_eq!(unit, b"* 1 FETCH (BODY {5}\r\nhello)\r\n");
    }

    #[test]
    fn test_literal_containing_crlf_and_tag_lookalike() {
        // The literal contains "\r\nA0001 OK\r\n", which must not be
        // treated as line structure.
        let payload = b"x\r\nA0001 OK\r\ny";
        let mut wire = format!("* 1 FETCH (BODY[TEXT] {{{}}}\r\n", payload.len()).into_bytes();
        wire.extend_from_slice(payload);
        wire.extend_from_slice(b")\r\nA0001 OK done\r\n");

        let mut framer = ResponseBuffer::new();
        framer.extend(&wire);

        let first = framer.try_next().unwrap().unwrap();
        assert!(first.starts_with(b"* 1 FETCH"));
        assert!(first.ends_with(b")\r\n"));
        // The literal bytes are inside the first unit, untouched.
        assert!(
            first
                .windows(payload.len())
                .any(|w| w == payload.as_slice())
        );

        let second = framer.try_next().unwrap().unwrap();
        assert_eq!(second, b"A0001 OK done\r\n");
    }

    #[test]
    fn test_incomplete_literal_defers_without_corruption() {
        let mut framer = ResponseBuffer::new();
        framer.extend(b"* 1 FETCH (BODY {10}\r\nhel");

        // Literal declares 10 bytes, only 3 arrived.
        assert!(framer.try_next().unwrap().is_none());

        framer.extend(b"lo world)\r\n");
        let unit = framer.try_next().unwrap().unwrap();
        assert_eq!(unit, b"* 1 FETCH (BODY {10}\r\nhello world)\r\n" as &[u8]);
    }

    #[test]
    fn test_chunked_delivery_equals_single_chunk() {
        let wire = b"* 1 FETCH (BODY {6}\r\nab\r\ncd X)\r\n* 2 EXISTS\r\n";

        let mut whole = ResponseBuffer::new();
        whole.extend(wire);
        let expected_first = whole.try_next().unwrap().unwrap();
        let expected_second = whole.try_next().unwrap().unwrap();

        // Deliver the same bytes two at a time.
        let mut chunked = ResponseBuffer::new();
        let mut units = Vec::new();
        for chunk in wire.chunks(2) {
            chunked.extend(chunk);
            while let Some(unit) = chunked.try_next().unwrap() {
                units.push(unit);
            }
        }

        assert_eq!(units, vec![expected_first, expected_second]);
    }

    #[test]
    fn test_multiple_literals_in_one_unit() {
        let wire =
            b"* 3 FETCH (BODY[HEADER] {4}\r\nH: v BODY[TEXT] {3}\r\nabc)\r\n";
        let mut framer = ResponseBuffer::new();
        framer.extend(wire);

        let unit = framer.try_next().unwrap().unwrap();
        assert_eq!(unit, wire.as_slice());
    }

    #[test]
    fn test_literal_too_large_rejected() {
        let mut framer = ResponseBuffer::new();
        framer.extend(format!("* 1 FETCH (BODY {{{}}}\r\n", MAX_LITERAL_SIZE + 1).as_bytes());
        assert!(framer.try_next().is_err());
    }

    #[test]
    fn test_line_too_long_rejected() {
        let mut framer = ResponseBuffer::new();
        framer.extend(&vec![b'a'; MAX_LINE_LENGTH + 10]);
        assert!(framer.try_next().is_err());
    }

    #[tokio::test]
    async fn test_framed_read_over_split_reads() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY {5}\r\nhel")
            .read(b"lo)\r\n")
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* 1 FETCH (BODY {5}\r\nhello)\r\n");
    }

    #[tokio::test]
    async fn test_accumulator_groups_until_tag() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"* CAPABILITY IMAP4rev1\r\n")
            .read(b"* 23 EXISTS\r\n")
            .read(b"A001 OK done\r\n")
            .build();

        let mut framed = FramedStream::new(mock, TIMEOUT);
        let accumulator = ResponseAccumulator::new("A001");

        let response = accumulator.read_until_tagged(&mut framed).await.unwrap();
        assert_eq!(response.untagged.len(), 2);
        assert_eq!(response.untagged[0], b"* CAPABILITY IMAP4rev1\r\n");
        assert_eq!(response.tagged, b"A001 OK done\r\n");
    }

    #[tokio::test]
    async fn test_accumulator_ignores_tag_prefix_inside_untagged() {
        use tokio_test::io::Builder;

        // "A0010 OK" must not complete the wait for tag "A001".
        let mock = Builder::new()
            .read(b"A0010 OK other\r\nA001 OK mine\r\n")
            .build();

        let mut framed = FramedStream::new(mock, TIMEOUT);
        let accumulator = ResponseAccumulator::new("A001");

        let response = accumulator.read_until_tagged(&mut framed).await.unwrap();
        assert_eq!(response.untagged.len(), 1);
        assert_eq!(response.tagged, b"A001 OK mine\r\n");
    }
}
