//! Query keys and request-list line parsing.

use std::collections::BTreeSet;
use std::fmt;

use super::isbn::is_isbn;

/// Queries shorter than this (in characters) are never sent to the search service.
pub const MIN_QUERY_LENGTH: usize = 3;

/// A request-list line starting with this character is ignored.
pub const COMMENT_MARKER: char = '#';

/// How a query will be searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// ISBN-10 or ISBN-13; searched with an exact match.
    Isbn,
    /// Free-text title or author; searched inexactly by title.
    Title,
}

/// An operator-supplied search term.
///
/// Identity is the trimmed literal string; no other canonicalization is
/// applied, so `"978-0-13-468599-1"` and `"9780134685991"` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Creates a key from raw input, or `None` when the input is blank.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classifies the key as ISBN or title text.
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        if is_isbn(&self.0) {
            QueryKind::Isbn
        } else {
            QueryKind::Title
        }
    }

    /// Returns true when the key meets [`MIN_QUERY_LENGTH`].
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        self.0.chars().count() >= MIN_QUERY_LENGTH
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parses request-list text into a set of query keys.
///
/// Blank lines and lines whose first character is [`COMMENT_MARKER`] are
/// skipped. The comment check looks at the raw line, so an indented `#` is
/// treated as query text.
#[must_use]
pub fn parse_request_lines(content: &str) -> BTreeSet<QueryKey> {
    content
        .lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .filter_map(QueryKey::new)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_key_trims_input() {
        let key = QueryKey::new("  Dune  ").unwrap();
        assert_eq!(key.as_str(), "Dune");
    }

    #[test]
    fn test_query_key_rejects_blank_input() {
        assert!(QueryKey::new("").is_none());
        assert!(QueryKey::new("   \t").is_none());
    }

    #[test]
    fn test_query_key_kind() {
        assert_eq!(
            QueryKey::new("978-0-13-468599-1").unwrap().kind(),
            QueryKind::Isbn
        );
        assert_eq!(
            QueryKey::new("The Pragmatic Programmer").unwrap().kind(),
            QueryKind::Title
        );
        assert_eq!(QueryKey::new("12345").unwrap().kind(), QueryKind::Title);
    }

    #[test]
    fn test_query_key_searchable_counts_characters() {
        assert!(!QueryKey::new("ab").unwrap().is_searchable());
        assert!(QueryKey::new("abc").unwrap().is_searchable());
        assert!(
            !QueryKey::new("é").unwrap().is_searchable(),
            "multi-byte characters count once"
        );
    }

    #[test]
    fn test_parse_request_lines_skips_comments_and_blanks() {
        let keys = parse_request_lines("# wanted books\n\nDune\n  \n978-0-13-468599-1\n");
        let values: Vec<&str> = keys.iter().map(QueryKey::as_str).collect();
        assert_eq!(values, vec!["978-0-13-468599-1", "Dune"]);
    }

    #[test]
    fn test_parse_request_lines_deduplicates_after_trim() {
        let keys = parse_request_lines("Dune\n Dune \nDune");
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_parse_request_lines_keeps_indented_hash() {
        let keys = parse_request_lines("  #1 bestseller");
        assert_eq!(keys.iter().next().unwrap().as_str(), "#1 bestseller");
    }
}
