use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use bookfetch_core::resolver::{Candidate, CatalogSearch, SearchError, SearchFilters};

/// In-memory catalog keyed by exact query string.
#[derive(Debug, Default)]
pub struct InMemorySearch {
    /// Results per query, in ranking order.
    pub results: HashMap<String, Vec<Candidate>>,
    /// Direct links per mirror reference.
    pub links: HashMap<String, String>,
    /// Queries whose search fails with a server error.
    pub failing: HashSet<String>,
    /// When false, filtered search reports itself unsupported.
    pub filtered_supported: bool,
    pub(crate) searched: Mutex<Vec<String>>,
    pub(crate) resolved: Mutex<Vec<String>>,
}

impl InMemorySearch {
    pub fn new() -> Self {
        Self {
            filtered_supported: true,
            ..Self::default()
        }
    }

    /// Adds one English EPUB result for `query`, downloadable from `link`.
    pub fn with_book(mut self, query: &str, title: &str, author: &str, link: &str) -> Self {
        let mirror = format!("mirror://{title}");
        self.results
            .entry(query.to_string())
            .or_default()
            .push(epub_candidate(title, author, &mirror));
        self.links.insert(mirror, link.to_string());
        self
    }

    pub fn with_results(mut self, query: &str, results: Vec<Candidate>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn without_filtered_search(mut self) -> Self {
        self.filtered_supported = false;
        self
    }

    /// Every query that reached the backend, in order.
    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().expect("searched lock").clone()
    }

    /// Every mirror a link was resolved for, in order.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().expect("resolved lock").clone()
    }

    fn lookup(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        self.searched
            .lock()
            .expect("searched lock")
            .push(query.to_string());
        if self.failing.contains(query) {
            return Err(SearchError::http_status("memory://search", 503));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

pub fn epub_candidate(title: &str, author: &str, mirror: &str) -> Candidate {
    Candidate {
        title: title.to_string(),
        author: author.to_string(),
        extension: Some("epub".to_string()),
        language: Some("English".to_string()),
        mirror: Some(mirror.to_string()),
    }
}

#[async_trait]
impl CatalogSearch for InMemorySearch {
    fn name(&self) -> &str {
        "memory"
    }

    async fn search_filtered(
        &self,
        query: &str,
        _filters: &SearchFilters,
        _exact_match: bool,
    ) -> Result<Vec<Candidate>, SearchError> {
        if !self.filtered_supported {
            return Err(SearchError::unsupported(self.name(), "filtered search"));
        }
        self.lookup(query)
    }

    async fn search_title(&self, query: &str) -> Result<Vec<Candidate>, SearchError> {
        self.lookup(query)
    }

    async fn resolve_download_link(
        &self,
        candidate: &Candidate,
    ) -> Result<Option<String>, SearchError> {
        let Some(mirror) = &candidate.mirror else {
            return Ok(None);
        };
        self.resolved
            .lock()
            .expect("resolved lock")
            .push(mirror.clone());
        Ok(self.links.get(mirror).cloned())
    }
}
