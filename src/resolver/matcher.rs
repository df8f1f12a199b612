//! Search policy and candidate selection.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::parser::{QueryKey, QueryKind};

use super::{Candidate, CatalogSearch, SearchError, SearchFilters};

/// Result of a resolver step.
///
/// Not-found and transient outcomes are both non-fatal for the run; the
/// distinction only matters for logs and reports.
#[derive(Debug)]
pub enum MatchOutcome<T> {
    /// The step produced a value.
    Found(T),
    /// Nothing qualifying exists (or the query was rejected).
    NotFound(String),
    /// The collaborator failed; the query is retried next run.
    Transient(SearchError),
}

impl<T> MatchOutcome<T> {
    /// Returns the found value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound(_) | Self::Transient(_) => None,
        }
    }
}

/// Resolves queries to a single qualifying candidate.
pub struct MatchResolver {
    search: Arc<dyn CatalogSearch>,
    filters: SearchFilters,
}

impl MatchResolver {
    /// Creates a resolver using the English EPUB filter.
    #[must_use]
    pub fn new(search: Arc<dyn CatalogSearch>) -> Self {
        Self {
            search,
            filters: SearchFilters::epub_english(),
        }
    }

    /// Finds the first qualifying candidate for `query`.
    ///
    /// ISBN queries use an exact-match search, anything else an inexact
    /// title search. Queries below the minimum length are rejected without
    /// contacting the backend. If the backend has no filtered search, the
    /// generic title search is tried before giving up.
    #[instrument(skip(self), fields(backend = self.search.name(), query = %query))]
    pub async fn find_candidate(&self, query: &QueryKey) -> MatchOutcome<Candidate> {
        let exact_match = match query.kind() {
            QueryKind::Isbn => {
                info!("detected ISBN; searching with exact match");
                true
            }
            QueryKind::Title => {
                info!("detected title query; searching with inexact match");
                false
            }
        };

        if !query.is_searchable() {
            info!("query too short for search");
            return MatchOutcome::NotFound("query too short for search".to_string());
        }

        let results = match self
            .search
            .search_filtered(query.as_str(), &self.filters, exact_match)
            .await
        {
            Ok(results) => results,
            Err(error) if error.is_unsupported() => {
                info!("falling back to generic title search");
                match self.search.search_title(query.as_str()).await {
                    Ok(results) => results,
                    Err(error) => {
                        error!(error = %error, "fallback search failed");
                        return MatchOutcome::Transient(error);
                    }
                }
            }
            Err(error) => {
                error!(error = %error, "search failed due to network/API error");
                return MatchOutcome::Transient(error);
            }
        };

        let total = results.len();
        match select_candidate(results, &self.filters) {
            Some(candidate) => {
                info!(
                    title = %candidate.title,
                    author = %candidate.author,
                    total,
                    "found qualifying candidate"
                );
                MatchOutcome::Found(candidate)
            }
            None => {
                info!(total, "book not found or no English EPUB available");
                MatchOutcome::NotFound(format!(
                    "no {} file in {} among {total} result(s)",
                    self.filters.extension, self.filters.language
                ))
            }
        }
    }

    /// Resolves the direct download link for a chosen candidate.
    ///
    /// Backend errors and empty links are both reported as not-found: the
    /// candidate exists but cannot be fetched this run.
    #[instrument(skip(self, candidate), fields(backend = self.search.name(), title = %candidate.title))]
    pub async fn resolve_link(&self, candidate: &Candidate) -> MatchOutcome<String> {
        match self.search.resolve_download_link(candidate).await {
            Ok(Some(url)) if !url.trim().is_empty() => MatchOutcome::Found(url.trim().to_string()),
            Ok(_) => {
                warn!("could not generate a direct download link");
                MatchOutcome::NotFound("no direct download link".to_string())
            }
            Err(error) => {
                error!(error = %error, "failed to resolve download link");
                MatchOutcome::NotFound(format!("failed to resolve download link: {error}"))
            }
        }
    }
}

impl std::fmt::Debug for MatchResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchResolver")
            .field("backend", &self.search.name())
            .field("filters", &self.filters)
            .finish()
    }
}

/// Returns the first result whose extension and language equal the filter
/// values, ignoring case.
#[must_use]
pub fn select_candidate(results: Vec<Candidate>, filters: &SearchFilters) -> Option<Candidate> {
    results.into_iter().find(|candidate| {
        field_equals(candidate.extension.as_deref(), &filters.extension)
            && field_equals(candidate.language.as_deref(), &filters.language)
    })
}

fn field_equals(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|v| v.trim().to_lowercase() == wanted.to_lowercase())
}
