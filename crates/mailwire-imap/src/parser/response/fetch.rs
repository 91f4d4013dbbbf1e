//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;
use crate::{Error, Result};

use super::parse_flag_list;
use super::types::{Address, Envelope, FetchItem};

/// Parses the parenthesized item list of a FETCH response.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                let upper = name.to_uppercase();
                match upper.as_str() {
                    "FLAGS" => {
                        lexer.expect_space()?;
                        let flags = parse_flag_list(lexer)?;
                        items.push(FetchItem::Flags(flags));
                    }
                    "UID" => {
                        lexer.expect_space()?;
                        let n = lexer.read_number()?;
                        let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "invalid UID 0".to_string(),
                        })?;
                        items.push(FetchItem::Uid(uid));
                    }
                    "RFC822.SIZE" => {
                        lexer.expect_space()?;
                        let size = lexer.read_number()?;
                        items.push(FetchItem::Rfc822Size(size));
                    }
                    "INTERNALDATE" => {
                        lexer.expect_space()?;
                        if let Token::QuotedString(date) = lexer.next_token()? {
                            items.push(FetchItem::InternalDate(date));
                        }
                    }
                    "ENVELOPE" => {
                        lexer.expect_space()?;
                        let envelope = parse_envelope(lexer)?;
                        items.push(FetchItem::Envelope(Box::new(envelope)));
                    }
                    "BODY" => {
                        let section = parse_body_section(lexer)?;

                        lexer.expect_space()?;
                        let data = match lexer.next_token()? {
                            Token::Literal(d) => Some(d),
                            Token::QuotedString(s) => Some(s.into_bytes()),
                            _ => None,
                        };

                        items.push(FetchItem::Body { section, data });
                    }
                    _ => {
                        // Skip unknown fetch items
                        skip_fetch_item(lexer)?;
                    }
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in FETCH: {token:?}"),
                });
            }
        }
    }

    Ok(items)
}

/// Parses the optional `[section]` after a BODY fetch item name.
fn parse_body_section(lexer: &mut Lexer<'_>) -> Result<Option<String>> {
    if lexer.peek() != Some(b'[') {
        return Ok(None);
    }
    lexer.advance();

    let mut section = String::new();
    loop {
        match lexer.peek() {
            Some(b']') => {
                lexer.advance();
                break;
            }
            Some(b) => {
                section.push(b as char);
                lexer.advance();
            }
            None => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: "Unterminated BODY section".to_string(),
                });
            }
        }
    }

    Ok((!section.is_empty()).then_some(section))
}

/// Parses an envelope structure: ten positional fields per RFC 3501.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;

    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;

    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;

    let message_id = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// Parses an address list: NIL or `((addr)(addr)...)`.
///
/// Malformed bytes between elements are skipped up to the next element or
/// the closing paren, so one damaged address does not drop its neighbors.
pub fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();

            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => {
                        addresses.push(parse_address(lexer)?);
                    }
                    Some(b' ') => {
                        lexer.advance();
                    }
                    Some(_) => {
                        // Garbage between elements: resynchronize.
                        while !matches!(lexer.peek(), Some(b'(' | b')') | None) {
                            lexer.advance();
                        }
                    }
                    None => break,
                }
            }

            Ok(addresses)
        }
        token => Err(Error::Parse {
            position: lexer.position(),
            message: format!("Expected address list, got {token:?}"),
        }),
    }
}

/// Parses a single address 4-tuple `(name adl mailbox host)`.
pub fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;

    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;

    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;

    let host = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Address {
        name,
        adl,
        mailbox,
        host,
    })
}

/// Skips an unknown fetch item value (atom, string, or nested list).
pub fn skip_fetch_item(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }

    let mut paren_depth = 0;

    loop {
        match lexer.peek() {
            Some(b'(') => {
                paren_depth += 1;
                lexer.advance();
            }
            Some(b')') => {
                if paren_depth == 0 {
                    break;
                }
                paren_depth -= 1;
                lexer.advance();
            }
            Some(b' ') if paren_depth == 0 => break,
            Some(b'{') => {
                // Consume the whole literal so its bytes aren't scanned.
                let _ = lexer.next_token()?;
            }
            Some(_) => {
                lexer.advance();
            }
            None => break,
        }
    }

    Ok(())
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
    fn test_parse_fetch_uid_and_flags() {
        let data = b"(UID 123 FLAGS (\\Seen))";
        let mut lexer = Lexer::new(data);
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], FetchItem::Uid(uid) if uid.get() == 123));
        assert!(matches!(&items[1], FetchItem::Flags(f) if f.is_seen()));
    }

    #[test]
    fn test_parse_fetch_uid_zero_rejected() {
        let data = b"(UID 0)";
        let mut lexer = Lexer::new(data);
        assert!(parse_fetch_response(&mut lexer).is_err());
    }

    #[test]
    fn test_parse_fetch_size() {
        let data = b"(RFC822.SIZE 1234)";
        let mut lexer = Lexer::new(data);
        let items = parse_fetch_response(&mut lexer).unwrap();
        assert_eq!(items, vec![FetchItem::Rfc822Size(1234)]);
    }

    #[test]
    fn test_parse_fetch_body_sections() {
        let data = b"(UID 7 BODY[HEADER] {15}\r\nSubject: hi\r\n\r\n BODY[TEXT] {5}\r\nhello)";
        let mut lexer = Lexer::new(data);
        let items = parse_fetch_response(&mut lexer).unwrap();

        assert_eq!(items.len(), 3);
        assert!(matches!(
            &items[1],
            FetchItem::Body { section: Some(s), data: Some(d) }
                if s == "HEADER" && d == b"Subject: hi\r\n\r\n"
        ));
        assert!(matches!(
            &items[2],
            FetchItem::Body { section: Some(s), data: Some(d) }
                if s == "TEXT" && d == b"hello"
        ));
    }

    #[test]
    fn test_parse_fetch_skips_unknown_items() {
        let data = b"(X-GM-MSGID 1278455344230334865 UID 5)";
        let mut lexer = Lexer::new(data);
        let items = parse_fetch_response(&mut lexer).unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], FetchItem::Uid(uid) if uid.get() == 5));
    }

    #[test]
    fn test_parse_envelope_positions() {
        let data = b"(\"Mon, 7 Feb 2022 10:00:00 +0000\" \"subject\" ((\"Ann\" NIL \"ann\" \"x.org\")) NIL ((NIL NIL \"reply\" \"x.org\")) ((NIL NIL \"bob\" \"y.org\")) NIL NIL NIL \"<id@x.org>\")";
        let mut lexer = Lexer::new(data);
        let envelope = parse_envelope(&mut lexer).unwrap();

        assert_eq!(
            envelope.date.as_deref(),
            Some("Mon, 7 Feb 2022 10:00:00 +0000")
        );
        assert_eq!(envelope.subject.as_deref(), Some("subject"));
        assert_eq!(envelope.from[0].email().unwrap(), "ann@x.org");
        assert_eq!(envelope.reply_to[0].email().unwrap(), "reply@x.org");
        assert_eq!(envelope.to[0].email().unwrap(), "bob@y.org");
        assert!(envelope.cc.is_empty());
        assert_eq!(envelope.message_id.as_deref(), Some("<id@x.org>"));
    }

    #[test]
    fn test_parse_envelope_escaped_quotes_in_subject() {
        let data = b"(NIL \"a \\\"quoted\\\" word\" NIL NIL NIL NIL NIL NIL NIL NIL)";
        let mut lexer = Lexer::new(data);
        let envelope = parse_envelope(&mut lexer).unwrap();
        assert_eq!(envelope.subject.as_deref(), Some("a \"quoted\" word"));
    }

    #[test]
    fn test_parse_envelope_literal_subject() {
        let data = b"(NIL {11}\r\nhello world NIL NIL NIL NIL NIL NIL NIL NIL)";
        let mut lexer = Lexer::new(data);
        let envelope = parse_envelope(&mut lexer).unwrap();
        assert_eq!(envelope.subject.as_deref(), Some("hello world"));
    }

    #[test]
    fn test_address_with_nil_host_excluded_from_email() {
        let data = b"((\"Group\" NIL \"undisclosed-recipients\" NIL))";
        let mut lexer = Lexer::new(data);
        let addresses = parse_address_list(&mut lexer).unwrap();

        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].email(), None);
    }

    #[test]
    fn test_address_list_nil() {
        let mut lexer = Lexer::new(b"NIL");
        assert!(parse_address_list(&mut lexer).unwrap().is_empty());
    }

    #[test]
    fn test_address_list_skips_garbage_between_elements() {
        let data = b"((NIL NIL \"a\" \"x.org\") ?? (NIL NIL \"b\" \"y.org\"))";
        let mut lexer = Lexer::new(data);
        let addresses = parse_address_list(&mut lexer).unwrap();

        assert_eq!(addresses.len(), 2);
        assert_eq!(addresses[0].email().unwrap(), "a@x.org");
        assert_eq!(addresses[1].email().unwrap(), "b@y.org");
    }
}
