//! Small regex-based helpers for scraping catalog HTML pages.

use std::sync::LazyLock;

use regex::Regex;

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"\s+"));

static NUMERIC_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&#(?:[xX]([0-9a-fA-F]{1,6})|([0-9]{1,7}));"));

/// Decodes numeric character references and the named entities that show up
/// in catalog pages.
///
/// `&amp;` is decoded last so `&amp;lt;` stays `&lt;`.
pub(crate) fn html_unescape_basic(value: &str) -> String {
    let named = value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&nbsp;", " ");
    decode_numeric_refs(&named).replace("&amp;", "&")
}

/// Replaces `&#NNN;` and `&#xHHH;` with their characters. References to
/// invalid code points are left as written.
fn decode_numeric_refs(value: &str) -> String {
    NUMERIC_REF_RE
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
                (None, None) => None,
            };
            code.and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Removes tags, decodes entities and collapses whitespace.
pub(crate) fn plain_text(fragment: &str) -> String {
    let without_tags = TAG_RE.replace_all(fragment, " ");
    let decoded = html_unescape_basic(&without_tags);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Returns the first capture group of `regex` in `haystack`, trimmed.
pub(crate) fn first_capture(haystack: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(haystack)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_tags_and_collapses_whitespace() {
        let text = plain_text("<a href=\"x\">The <i>Rust</i>\n   Book</a>");
        assert_eq!(text, "The Rust Book");
    }

    #[test]
    fn test_html_unescape_basic_decodes_amp_last() {
        assert_eq!(html_unescape_basic("Tom &amp;amp; Jerry"), "Tom &amp; Jerry");
        assert_eq!(html_unescape_basic("a &lt;b&gt; &quot;c&quot;"), "a <b> \"c\"");
    }

    #[test]
    fn test_html_unescape_basic_decodes_numeric_references() {
        assert_eq!(html_unescape_basic("Ender&#8217;s Game"), "Ender\u{2019}s Game");
        assert_eq!(html_unescape_basic("Caf&#xE9; &#39;Noir&#039;"), "Caf\u{e9} 'Noir'");
        assert_eq!(html_unescape_basic("bad &#xD800; ref"), "bad &#xD800; ref");
        assert_eq!(html_unescape_basic("&amp;#8217;"), "&#8217;");
    }

    #[test]
    fn test_first_capture_trims() {
        let re = compile_static_regex(r"<title>(.*?)</title>");
        assert_eq!(
            first_capture("<title>  Dune </title>", &re).as_deref(),
            Some("Dune")
        );
        assert!(first_capture("<h1>Dune</h1>", &re).is_none());
    }
}
