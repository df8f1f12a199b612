//! Error types for the reader-compatibility transform.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::ProcessError;

/// Errors that can occur inspecting or converting an EPUB.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The file is not a readable zip archive.
    #[error("cannot read archive {path}: {source}")]
    Archive {
        /// The archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A filesystem operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The converter failed or is missing.
    #[error("converter failed: {source}")]
    Tool {
        /// The process failure.
        #[source]
        source: ProcessError,
    },
}

impl TransformError {
    /// Creates an `Archive` error.
    pub fn archive(path: impl AsRef<Path>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates an `Io` error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a `Tool` error.
    pub fn tool(source: ProcessError) -> Self {
        Self::Tool { source }
    }
}
