//! Staging filename construction.

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::compile_static_regex;

/// Extension of every acquired file.
pub const ACQUIRED_EXTENSION: &str = "epub";

static UNSAFE_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"[\\/:*?"<>|]"#));
static SEPARATOR_RUN_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"[- ]+"));

/// Makes one filename component safe.
///
/// Filesystem-unsafe characters become `-`, then every run of hyphens and
/// spaces collapses to a single space. Note this also turns legitimate
/// hyphens (`Spider-Man`) into spaces.
///
/// ```
/// use bookfetch_core::download::sanitize_filename;
///
/// assert_eq!(sanitize_filename("C++: The  Guide"), "C++ The Guide");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced = UNSAFE_CHARS_RE.replace_all(name, "-");
    SEPARATOR_RUN_RE
        .replace_all(&replaced, " ")
        .trim()
        .to_string()
}

/// Builds the staging filename `"{author} - {title}.epub"`.
#[must_use]
pub fn acquired_filename(author: &str, title: &str) -> String {
    format!(
        "{} - {}.{ACQUIRED_EXTENSION}",
        sanitize_filename(author),
        sanitize_filename(title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_replaces_every_unsafe_character() {
        let sanitized = sanitize_filename(r#"a\b/c:d*e?f"g<h>i|j"#);
        for ch in ['\\', '/', ':', '*', '?', '"', '<', '>', '|'] {
            assert!(!sanitized.contains(ch), "{ch} survived in {sanitized}");
        }
        assert_eq!(sanitized, "a b c d e f g h i j");
    }

    #[test]
    fn test_sanitize_filename_collapses_space_and_hyphen_runs() {
        assert_eq!(sanitize_filename("Spider-Man -- Into   the - Verse"), "Spider Man Into the Verse");
    }

    #[test]
    fn test_sanitize_filename_trims_edges() {
        assert_eq!(sanitize_filename("  -Dune-  "), "Dune");
    }

    #[test]
    fn test_acquired_filename_layout() {
        assert_eq!(
            acquired_filename("Hunt, Andrew", "The Pragmatic Programmer: 20th Anniversary"),
            "Hunt, Andrew - The Pragmatic Programmer 20th Anniversary.epub"
        );
    }

    #[test]
    fn test_acquired_filename_has_no_unsafe_characters() {
        let name = acquired_filename("A/B", "C|D?");
        let stem = name.trim_end_matches(".epub");
        assert!(!stem.contains(['\\', '/', ':', '*', '?', '"', '<', '>', '|']));
        assert!(!stem.contains("  "));
    }
}
