//! Error types for library scanning.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reading a book's package metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A filesystem operation failed.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The book path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file could not be opened as an EPUB document.
    #[error("cannot read EPUB {path}: {reason}")]
    Document {
        /// The book path.
        path: PathBuf,
        /// What the EPUB reader reported.
        reason: String,
    },
}

impl MetadataError {
    /// Creates an `Io` error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a `Document` error.
    pub fn document(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Document {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Returned when an event shape name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event shape '{0}' (expected v1, v2 or v3)")]
pub struct UnknownEventShape(pub String);
