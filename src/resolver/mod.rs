//! Match resolution: turning a query into one downloadable candidate.
//!
//! # Architecture
//!
//! - [`CatalogSearch`] - Async trait over the external catalog search service
//! - [`LibgenClient`] - HTTP implementation against a Library Genesis mirror
//! - [`MatchResolver`] - Search policy (ISBN vs title, fallback, selection)
//! - [`MatchOutcome`] - Found / not-found / transient result, no exceptions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bookfetch_core::parser::QueryKey;
//! use bookfetch_core::resolver::{LibgenClient, MatchOutcome, MatchResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = MatchResolver::new(Arc::new(LibgenClient::new()?));
//! let query = QueryKey::new("978-0-13-468599-1").ok_or("blank query")?;
//! if let MatchOutcome::Found(candidate) = resolver.find_candidate(&query).await {
//!     println!("{} by {}", candidate.title, candidate.author);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod http_client;
mod libgen;
mod matcher;

pub use error::SearchError;
pub use http_client::build_search_http_client;
pub use libgen::LibgenClient;
pub use matcher::{MatchOutcome, MatchResolver, select_candidate};

use async_trait::async_trait;

/// Attribute filter applied to search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    /// Required file extension, e.g. `epub`.
    pub extension: String,
    /// Required language, e.g. `English`.
    pub language: String,
}

impl SearchFilters {
    /// The only filter the pipeline uses: English EPUB files.
    #[must_use]
    pub fn epub_english() -> Self {
        Self {
            extension: "epub".to_string(),
            language: "English".to_string(),
        }
    }
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self::epub_english()
    }
}

/// One search result.
///
/// `author` is whatever the catalog reports and may be in
/// `"Lastname, Firstname"` form. `mirror` is the unresolved download
/// reference; a direct link must still be resolved from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Book title.
    pub title: String,
    /// Author as listed.
    pub author: String,
    /// File extension, when listed.
    pub extension: Option<String>,
    /// Language, when listed.
    pub language: Option<String>,
    /// Unresolved download reference (mirror page URL).
    pub mirror: Option<String>,
}

/// External catalog search service.
///
/// Results are returned in the backend's ranking order.
///
/// # Object Safety
///
/// Uses `async_trait` so the pipeline can hold an `Arc<dyn CatalogSearch>`.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Returns the backend's name for logs.
    fn name(&self) -> &str;

    /// Searches with an attribute filter.
    ///
    /// Backends without filter support keep the default, which reports
    /// [`SearchError::Unsupported`].
    async fn search_filtered(
        &self,
        _query: &str,
        _filters: &SearchFilters,
        _exact_match: bool,
    ) -> Result<Vec<Candidate>, SearchError> {
        Err(SearchError::unsupported(self.name(), "filtered search"))
    }

    /// Generic, unfiltered title search.
    async fn search_title(&self, query: &str) -> Result<Vec<Candidate>, SearchError>;

    /// Resolves a direct download link for a candidate.
    ///
    /// `Ok(None)` means the backend answered but offered no link.
    async fn resolve_download_link(
        &self,
        candidate: &Candidate,
    ) -> Result<Option<String>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_are_english_epub() {
        let filters = SearchFilters::default();
        assert_eq!(filters.extension, "epub");
        assert_eq!(filters.language, "English");
    }
}
