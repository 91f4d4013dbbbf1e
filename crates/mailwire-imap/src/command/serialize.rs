//! Command serialization helpers.

use crate::types::Mailbox;

use super::types::{FetchAttribute, FetchItems, SearchCriteria, StoreAction};

/// Writes an astring (bare atom, or quoted when quoting is required).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a quoted string with `"` and `\` backslash-escaped.
pub fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Writes FETCH items as a parenthesized list.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    buf.push(b'(');
    for (i, attr) in items.0.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        write_fetch_attribute(buf, attr);
    }
    buf.push(b')');
}

/// Writes a single FETCH attribute.
pub fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Envelope => buf.extend_from_slice(b"ENVELOPE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body { section, peek } => {
            if *peek {
                buf.extend_from_slice(b"BODY.PEEK[");
            } else {
                buf.extend_from_slice(b"BODY[");
            }
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
        }
    }
}

/// Writes a STORE action.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction) {
    let (prefix, flags) = match action {
        StoreAction::SetFlags(f) => ("FLAGS", f),
        StoreAction::AddFlags(f) => ("+FLAGS", f),
        StoreAction::RemoveFlags(f) => ("-FLAGS", f),
    };

    buf.extend_from_slice(prefix.as_bytes());
    buf.extend_from_slice(b" (");
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Writes SEARCH criteria.
///
/// OR operands are parenthesized so nested alternations stay unambiguous:
/// `OR (OR (TO "a") (TO "b")) (TO "c")`.
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Seen => buf.extend_from_slice(b"SEEN"),
        SearchCriteria::Unseen => buf.extend_from_slice(b"UNSEEN"),
        SearchCriteria::Subject(s) => {
            buf.extend_from_slice(b"SUBJECT ");
            write_quoted(buf, s);
        }
        SearchCriteria::From(s) => {
            buf.extend_from_slice(b"FROM ");
            write_quoted(buf, s);
        }
        SearchCriteria::To(s) => {
            buf.extend_from_slice(b"TO ");
            write_quoted(buf, s);
        }
        SearchCriteria::Text(s) => {
            buf.extend_from_slice(b"TEXT ");
            write_quoted(buf, s);
        }
        SearchCriteria::And(criteria) => {
            for (i, c) in criteria.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_criteria(buf, c);
            }
        }
        SearchCriteria::Or(a, b) => {
            buf.extend_from_slice(b"OR (");
            write_search_criteria(buf, a);
            buf.extend_from_slice(b") (");
            write_search_criteria(buf, b);
            buf.push(b')');
        }
        SearchCriteria::Not(c) => {
            buf.extend_from_slice(b"NOT (");
            write_search_criteria(buf, c);
            buf.push(b')');
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

    fn render_search(criteria: &SearchCriteria) -> String {
        let mut buf = Vec::new();
        write_search_criteria(&mut buf, criteria);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_astring_bare_atom() {
        let mut buf = Vec::new();
        write_astring(&mut buf, "INBOX");
        assert_eq!(buf, b"INBOX");
    }

    #[test]
    fn test_astring_quotes_when_needed() {
        let mut buf = Vec::new();
        write_astring(&mut buf, "Sent Items");
        assert_eq!(buf, b"\"Sent Items\"");
    }

    #[test]
    fn test_quoted_escapes() {
        let mut buf = Vec::new();
        write_quoted(&mut buf, "pa\"ss\\word");
        assert_eq!(buf, b"\"pa\\\"ss\\\\word\"");
    }

    #[test]
    fn test_fetch_items_header_summary() {
        let mut buf = Vec::new();
        write_fetch_items(&mut buf, &super::super::FetchItems::header_summary());
        assert_eq!(buf, b"(UID FLAGS ENVELOPE RFC822.SIZE)");
    }

    #[test]
    fn test_fetch_items_body_sections() {
        let mut buf = Vec::new();
        write_fetch_items(&mut buf, &super::super::FetchItems::body_sections());
        assert_eq!(buf, b"(BODY[HEADER] BODY[TEXT])");
    }

    #[test]
    fn test_store_action_add() {
        let mut buf = Vec::new();
        write_store_action(
            &mut buf,
            &StoreAction::AddFlags(vec![crate::types::Flag::Seen]),
        );
        assert_eq!(buf, b"+FLAGS (\\Seen)");
    }

    #[test]
    fn test_store_action_remove() {
        let mut buf = Vec::new();
        write_store_action(
            &mut buf,
            &StoreAction::RemoveFlags(vec![crate::types::Flag::Seen]),
        );
        assert_eq!(buf, b"-FLAGS (\\Seen)");
    }

    #[test]
    fn test_search_or_nesting() {
        let criteria = SearchCriteria::any_recipient(&[
            "a@x".to_string(),
            "b@y".to_string(),
            "c@z".to_string(),
        ])
        .unwrap();

        assert_eq!(
            render_search(&criteria),
            "OR (OR (TO \"a@x\") (TO \"b@y\")) (TO \"c@z\")"
        );
    }

    #[test]
    fn test_search_strings_always_quoted() {
        assert_eq!(
            render_search(&SearchCriteria::To("a@x".to_string())),
            "TO \"a@x\""
        );
        assert_eq!(
            render_search(&SearchCriteria::Subject("hi there".to_string())),
            "SUBJECT \"hi there\""
        );
    }
}
