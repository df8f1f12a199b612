//! Errors that prevent a run from starting.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::download::DownloadError;
use crate::resolver::SearchError;

/// Setup failures. Everything after setup is absorbed into the run report.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The catalog search client could not be built.
    #[error("cannot set up catalog search: {source}")]
    SearchSetup {
        /// The underlying error.
        #[source]
        source: SearchError,
    },

    /// The download client could not be built.
    #[error("cannot set up downloads: {source}")]
    DownloadSetup {
        /// The underlying error.
        #[source]
        source: DownloadError,
    },

    /// The staging directory could not be created.
    #[error("cannot create staging directory {path}: {source}")]
    Staging {
        /// The staging directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Creates a `SearchSetup` error.
    pub fn search_setup(source: SearchError) -> Self {
        Self::SearchSetup { source }
    }

    /// Creates a `DownloadSetup` error.
    pub fn download_setup(source: DownloadError) -> Self {
        Self::DownloadSetup { source }
    }

    /// Creates a `Staging` error.
    pub fn staging(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Staging {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
