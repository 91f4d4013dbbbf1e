//! Parser helper functions.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListEntry, Mailbox, MailboxAttribute, ResponseCode, SeqNum, Uid,
    UidValidity,
};
use crate::{Error, Result};

/// Parses a bracketed response code.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let upper = atom.to_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid UID 0".to_string(),
            })?;
            ResponseCode::UidNext(uid)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            let validity = UidValidity::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid UIDVALIDITY 0".to_string(),
            })?;
            ResponseCode::UidValidity(validity)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            let seq = SeqNum::new(n).ok_or_else(|| Error::Parse {
                position: lexer.position(),
                message: "Invalid sequence number 0".to_string(),
            })?;
            ResponseCode::Unseen(seq)
        }
        "CAPABILITY" => {
            let caps = parse_capability_data(lexer)?;
            ResponseCode::Capability(caps)
        }
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = parse_flag_list(lexer)?;
            ResponseCode::PermanentFlags(flags.into_iter().collect())
        }
        _ => {
            // Unrecognized code: skip its data up to the bracket.
            while lexer.peek() != Some(b']') && !lexer.is_eof() {
                lexer.advance();
            }
            ResponseCode::Unknown(atom.to_string())
        }
    };

    // Skip any trailing data we didn't consume.
    while lexer.peek() != Some(b']') && !lexer.is_eof() {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

/// Parses space-separated capability atoms.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }

    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            Token::Space => {}
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in flag list: {token:?}"),
                });
            }
        }
    }

    Ok(flags)
}

/// Parses a LIST response body: `(attrs) "delim" name`.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListEntry> {
    lexer.expect(Token::LParen)?;

    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            Token::Space => {}
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in LIST attributes: {token:?}"),
                });
            }
        }
    }

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::QuotedString(s) => s.chars().next(),
        Token::Nil => None,
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("Expected delimiter, got {token:?}"),
            });
        }
    };

    lexer.expect_space()?;
    let name = match lexer.next_token()? {
        Token::QuotedString(s) => s,
        Token::Atom(s) => s.to_string(),
        Token::Literal(data) => String::from_utf8_lossy(&data).into_owned(),
        token => {
            return Err(Error::Parse {
                position: lexer.position(),
                message: format!("Expected mailbox name, got {token:?}"),
            });
        }
    };

    Ok(ListEntry {
        attributes,
        delimiter,
        mailbox: Mailbox::new(name),
    })
}

/// Parses the number list of a SEARCH response.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut numbers = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::Space => {}
            Token::Number(n) => numbers.push(n),
            Token::Crlf | Token::Eof => break,
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in SEARCH response: {token:?}"),
                });
            }
        }
    }

    Ok(numbers)
}

/// Reads remaining text up to CRLF (or end of input).
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let mut text = Vec::new();

    while let Some(b) = lexer.peek() {
        if b == b'\r' || b == b'\n' {
            break;
        }
        text.push(b);
        lexer.advance();
    }

    String::from_utf8_lossy(&text).into_owned()
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
    fn test_parse_response_code_uidvalidity() {
        let mut lexer = Lexer::new(b"[UIDVALIDITY 1234567890]");
        let code = parse_response_code(&mut lexer).unwrap();
        assert_eq!(
            code,
            ResponseCode::UidValidity(UidValidity::new(1234567890).unwrap())
        );
    }

    #[test]
    fn test_parse_response_code_unknown_skipped() {
        let mut lexer = Lexer::new(b"[HIGHESTMODSEQ 715194045007] rest");
        let code = parse_response_code(&mut lexer).unwrap();
        assert_eq!(code, ResponseCode::Unknown("HIGHESTMODSEQ".to_string()));
    }

    #[test]
    fn test_parse_flag_list() {
        let mut lexer = Lexer::new(b"(\\Seen \\Deleted custom)");
        let flags = parse_flag_list(&mut lexer).unwrap();
        assert!(flags.is_seen());
        assert!(flags.is_deleted());
        assert!(flags.contains(&Flag::Keyword("custom".to_string())));
    }

    #[test]
    fn test_parse_list_response() {
        let mut lexer = Lexer::new(b"(\\HasChildren) \"/\" \"INBOX\"");
        let entry = parse_list_response(&mut lexer).unwrap();
        assert!(entry.attributes.contains(&MailboxAttribute::HasChildren));
        assert_eq!(entry.delimiter, Some('/'));
        assert_eq!(entry.mailbox.as_str(), "INBOX");
    }

    #[test]
    fn test_parse_list_response_nil_delimiter() {
        let mut lexer = Lexer::new(b"(\\Noselect) NIL Archive");
        let entry = parse_list_response(&mut lexer).unwrap();
        assert_eq!(entry.delimiter, None);
        assert_eq!(entry.mailbox.as_str(), "Archive");
        assert!(!entry.is_selectable());
    }

    #[test]
    fn test_parse_search_numbers() {
        let mut lexer = Lexer::new(b" 4827 313 9001\r\n");
        let numbers = parse_search_response(&mut lexer).unwrap();
        assert_eq!(numbers, vec![4827, 313, 9001]);
    }

    #[test]
    fn test_parse_search_empty() {
        let mut lexer = Lexer::new(b"\r\n");
        let numbers = parse_search_response(&mut lexer).unwrap();
        assert!(numbers.is_empty());
    }
}
