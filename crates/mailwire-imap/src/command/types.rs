//! Command-related type definitions.

use crate::types::Flag;

/// FETCH items to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItems(pub Vec<FetchAttribute>);

impl FetchItems {
    /// The attribute set used for header listings.
    #[must_use]
    pub fn header_summary() -> Self {
        Self(vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::Envelope,
            FetchAttribute::Rfc822Size,
        ])
    }

    /// The attribute set used for body retrieval.
    #[must_use]
    pub fn body_sections() -> Self {
        Self(vec![
            FetchAttribute::Body {
                section: Some("HEADER".to_string()),
                peek: false,
            },
            FetchAttribute::Body {
                section: Some("TEXT".to_string()),
                peek: false,
            },
        ])
    }
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// RFC822 size.
    Rfc822Size,
    /// Envelope structure.
    Envelope,
    /// UID.
    Uid,
    /// Body section.
    Body {
        /// Section specifier (e.g., `HEADER`, `TEXT`).
        section: Option<String>,
        /// Peek (don't set \Seen).
        peek: bool,
    },
}

/// STORE action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace flags.
    SetFlags(Vec<Flag>),
    /// Add flags.
    AddFlags(Vec<Flag>),
    /// Remove flags.
    RemoveFlags(Vec<Flag>),
}

/// SEARCH criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with \Seen flag.
    Seen,
    /// Messages without \Seen flag.
    Unseen,
    /// Subject contains text.
    Subject(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Text in header or body.
    Text(String),
    /// AND of criteria (juxtaposition).
    And(Vec<Self>),
    /// OR of two criteria. IMAP SEARCH has no N-ary OR; wider alternations
    /// are built as left-associative binary chains.
    Or(Box<Self>, Box<Self>),
    /// NOT of a criterion.
    Not(Box<Self>),
}

impl SearchCriteria {
    /// Builds a left-associative OR chain over `TO "<addr>"` terms:
    /// `OR (OR (TO "a") (TO "b")) (TO "c")`.
    ///
    /// Returns `None` for an empty recipient list.
    #[must_use]
    pub fn any_recipient(recipients: &[String]) -> Option<Self> {
        let mut iter = recipients.iter();
        let first = Self::To(iter.next()?.clone());
        Some(iter.fold(first, |acc, recipient| {
            Self::Or(Box::new(acc), Box::new(Self::To(recipient.clone())))
        }))
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

    #[test]
    fn test_any_recipient_single() {
        let criteria = SearchCriteria::any_recipient(&["a@x".to_string()]).unwrap();
        assert_eq!(criteria, SearchCriteria::To("a@x".to_string()));
    }

    #[test]
    fn test_any_recipient_left_associative() {
        let criteria = SearchCriteria::any_recipient(&[
            "a@x".to_string(),
            "b@y".to_string(),
            "c@z".to_string(),
        ])
        .unwrap();

        let expected = SearchCriteria::Or(
            Box::new(SearchCriteria::Or(
                Box::new(SearchCriteria::To("a@x".to_string())),
                Box::new(SearchCriteria::To("b@y".to_string())),
            )),
            Box::new(SearchCriteria::To("c@z".to_string())),
        );
        assert_eq!(criteria, expected);
    }

    #[test]
    fn test_any_recipient_empty() {
        assert!(SearchCriteria::any_recipient(&[]).is_none());
    }
}
