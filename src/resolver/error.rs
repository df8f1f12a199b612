//! Error types for catalog search operations.

use thiserror::Error;

/// Errors returned by a [`CatalogSearch`](super::CatalogSearch) backend.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend does not offer the requested capability.
    ///
    /// The match resolver treats this as a cue to fall back to the generic
    /// title search rather than as a failure.
    #[error("{backend} does not support {capability}")]
    Unsupported {
        /// Backend name.
        backend: String,
        /// The missing capability.
        capability: String,
    },

    /// Network-level error (DNS, connection refused, TLS, timeout).
    #[error("network error querying {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The URL being requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A response could not be interpreted.
    #[error("unexpected response from {url}: {reason}")]
    Parse {
        /// The URL being requested.
        url: String,
        /// What was wrong with the response.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("search client construction failed: {reason}")]
    Client {
        /// Why construction failed.
        reason: String,
    },
}

impl SearchError {
    /// Creates an `Unsupported` error.
    pub fn unsupported(backend: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::Unsupported {
            backend: backend.into(),
            capability: capability.into(),
        }
    }

    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a parse error.
    pub fn parse(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a client construction error.
    pub fn client(reason: impl Into<String>) -> Self {
        Self::Client {
            reason: reason.into(),
        }
    }

    /// Returns true when the capability is missing rather than failing.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
