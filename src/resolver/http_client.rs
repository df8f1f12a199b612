//! HTTP client construction for search backends.

use std::time::Duration;

use reqwest::Client;

use crate::user_agent;

use super::SearchError;

/// Connect timeout for search requests.
pub const SEARCH_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Overall timeout for a single search or mirror-page request.
pub const SEARCH_READ_TIMEOUT_SECS: u64 = 60;

/// Builds the client used for catalog search and link resolution.
///
/// # Errors
///
/// Returns [`SearchError::Client`] when the builder rejects the configuration.
pub fn build_search_http_client() -> Result<Client, SearchError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(SEARCH_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(SEARCH_READ_TIMEOUT_SECS))
        .gzip(true)
        .user_agent(user_agent::default_search_user_agent())
        .build()
        .map_err(|e| SearchError::client(e.to_string()))
}
