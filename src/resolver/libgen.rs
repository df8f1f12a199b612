//! Library Genesis search backend.
//!
//! Searches the mirror's `index.php` results table and resolves direct
//! links from the per-file `ads.php` page. Both are scraped with regexes;
//! the table layout is the mirror's, not ours, so parsing is lenient and a
//! row that does not look like a result is skipped rather than failing the
//! whole search.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::markup::{compile_static_regex, first_capture, html_unescape_basic, plain_text};

use super::http_client::build_search_http_client;
use super::{Candidate, CatalogSearch, SearchError, SearchFilters};

/// Default mirror base URL.
const DEFAULT_BASE_URL: &str = "https://libgen.bz";

/// Results requested per search page.
const RESULTS_PER_PAGE: &str = "100";

/// Columns searched when matching exactly: title, author, series, year,
/// publisher and ISBN.
const DEFAULT_COLUMNS: [&str; 6] = ["t", "a", "s", "y", "p", "i"];

/// Columns searched for inexact title queries.
const TITLE_COLUMNS: [&str; 1] = ["t"];

/// Result table cell positions.
const TITLE_CELL: usize = 0;
const AUTHOR_CELL: usize = 1;
const LANGUAGE_CELL: usize = 4;
const EXTENSION_CELL: usize = 7;
const MIRRORS_CELL: usize = 8;

static ROW_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?is)<tr[^>]*>(.*?)</tr>"));
static CELL_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?is)<td[^>]*>(.*?)</td>"));
static ANCHOR_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?is)<a\s[^>]*>(.*?)</a>"));
static MIRROR_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)href\s*=\s*["']([^"']*ads\.php\?md5=[0-9a-f]{32}[^"']*)["']"#)
});
static GET_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)href\s*=\s*["']([^"']*get\.php\?md5=[^"']+)["']"#)
});

/// [`CatalogSearch`] implementation for a Library Genesis mirror.
pub struct LibgenClient {
    client: Client,
    base_url: Url,
}

impl LibgenClient {
    /// Creates a client for the default mirror.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if HTTP client construction fails.
    pub fn new() -> Result<Self, SearchError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client for a specific mirror (also used with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the URL is invalid or client construction fails.
    pub fn with_base_url(base_url: &str) -> Result<Self, SearchError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| SearchError::client(format!("invalid mirror URL '{base_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: build_search_http_client()?,
            base_url,
        })
    }

    async fn search_columns(
        &self,
        query: &str,
        columns: &[&str],
    ) -> Result<Vec<Candidate>, SearchError> {
        let url = self
            .base_url
            .join("index.php")
            .map_err(|e| SearchError::client(e.to_string()))?;

        let mut params: Vec<(&str, &str)> = vec![("req", query)];
        params.extend(columns.iter().map(|column| ("columns[]", *column)));
        params.extend([
            ("objects[]", "f"),
            ("topics[]", "l"),
            ("res", RESULTS_PER_PAGE),
            ("filesuns", "all"),
        ]);

        debug!(url = %url, "querying mirror");
        let html = self.fetch_page(url.as_str(), Some(&params)).await?;
        let candidates = parse_results_page(&html, &url);
        debug!(count = candidates.len(), "parsed search results");
        Ok(candidates)
    }

    async fn fetch_page(
        &self,
        url: &str,
        params: Option<&[(&str, &str)]>,
    ) -> Result<String, SearchError> {
        let mut request = self.client.get(url);
        if let Some(params) = params {
            request = request.query(params);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SearchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::http_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| SearchError::network(url, e))
    }
}

impl std::fmt::Debug for LibgenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibgenClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogSearch for LibgenClient {
    fn name(&self) -> &'static str {
        "libgen"
    }

    /// Exact searches span every indexed column (ISBNs live in their own
    /// column); inexact searches target titles only.
    #[instrument(skip(self, filters), fields(backend = "libgen"))]
    async fn search_filtered(
        &self,
        query: &str,
        filters: &SearchFilters,
        exact_match: bool,
    ) -> Result<Vec<Candidate>, SearchError> {
        let columns: &[&str] = if exact_match {
            &DEFAULT_COLUMNS
        } else {
            &TITLE_COLUMNS
        };
        let candidates = self.search_columns(query, columns).await?;
        Ok(apply_filters(candidates, filters, exact_match))
    }

    #[instrument(skip(self), fields(backend = "libgen"))]
    async fn search_title(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        self.search_columns(query, &TITLE_COLUMNS).await
    }

    #[instrument(skip(self, candidate), fields(backend = "libgen", title = %candidate.title))]
    async fn resolve_download_link(
        &self,
        candidate: &Candidate,
    ) -> Result<Option<String>, SearchError> {
        let Some(mirror) = candidate.mirror.as_deref() else {
            return Ok(None);
        };
        let mirror_url = self
            .base_url
            .join(mirror)
            .map_err(|e| SearchError::parse(mirror, format!("invalid mirror link: {e}")))?;

        let html = self.fetch_page(mirror_url.as_str(), None).await?;
        let Some(href) = first_capture(&html, &GET_HREF_RE) else {
            warn!(mirror = %mirror_url, "mirror page has no download link");
            return Ok(None);
        };

        let resolved = mirror_url
            .join(&html_unescape_basic(&href))
            .map_err(|e| SearchError::parse(mirror_url.as_str(), format!("invalid download link: {e}")))?;
        Ok(Some(resolved.to_string()))
    }
}

/// Extracts candidates from a results page, in page order.
fn parse_results_page(html: &str, page_url: &Url) -> Vec<Candidate> {
    ROW_RE
        .captures_iter(html)
        .filter_map(|row| row.get(1).and_then(|m| parse_result_row(m.as_str(), page_url)))
        .collect()
}

fn parse_result_row(row_html: &str, page_url: &Url) -> Option<Candidate> {
    let cells: Vec<&str> = CELL_RE
        .captures_iter(row_html)
        .filter_map(|cell| cell.get(1).map(|m| m.as_str()))
        .collect();
    if cells.len() <= MIRRORS_CELL {
        return None;
    }

    let title = title_from_cell(cells[TITLE_CELL]);
    if title.is_empty() {
        return None;
    }

    let mirror = first_capture(cells[MIRRORS_CELL], &MIRROR_HREF_RE)
        .map(|href| html_unescape_basic(&href))
        .and_then(|href| page_url.join(&href).ok())
        .map(|url| url.to_string());

    Some(Candidate {
        title,
        author: plain_text(cells[AUTHOR_CELL]),
        extension: non_empty(plain_text(cells[EXTENSION_CELL])),
        language: non_empty(plain_text(cells[LANGUAGE_CELL])),
        mirror,
    })
}

/// The title cell mixes the title link with series, ISBN and edition links;
/// the first non-empty link text is the title.
fn title_from_cell(cell: &str) -> String {
    ANCHOR_TEXT_RE
        .captures_iter(cell)
        .filter_map(|caps| caps.get(1).map(|m| plain_text(m.as_str())))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| plain_text(cell))
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Keeps candidates matching every filter attribute: equal (ignoring case)
/// for exact searches, substring otherwise.
fn apply_filters(
    candidates: Vec<Candidate>,
    filters: &SearchFilters,
    exact_match: bool,
) -> Vec<Candidate> {
    let matches = |value: Option<&str>, wanted: &str| {
        let Some(value) = value else {
            return false;
        };
        let value = value.to_lowercase();
        let wanted = wanted.to_lowercase();
        if exact_match {
            value == wanted
        } else {
            value.contains(&wanted)
        }
    };

    candidates
        .into_iter()
        .filter(|c| {
            matches(c.extension.as_deref(), &filters.extension)
                && matches(c.language.as_deref(), &filters.language)
        })
        .collect()
}
