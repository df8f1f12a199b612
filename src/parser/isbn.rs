//! ISBN-10/13 detection.

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::compile_static_regex;

/// Nine digits followed by a digit or the `X` check character.
static ISBN10_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^\d{9}[0-9X]$"));

static ISBN13_PATTERN: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^\d{13}$"));

/// Strips hyphens and spaces and uppercases the remainder.
#[must_use]
pub fn normalize_isbn(query: &str) -> String {
    query
        .chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect::<String>()
        .to_uppercase()
}

/// Returns true when `query` looks like an ISBN-10 or ISBN-13.
///
/// Only the shape is checked; check digits are not validated.
///
/// ```
/// use bookfetch_core::parser::is_isbn;
///
/// assert!(is_isbn("978-0-13-468599-1"));
/// assert!(!is_isbn("The Pragmatic Programmer"));
/// ```
#[must_use]
pub fn is_isbn(query: &str) -> bool {
    let cleaned = normalize_isbn(query);
    ISBN10_PATTERN.is_match(&cleaned) || ISBN13_PATTERN.is_match(&cleaned)
}
