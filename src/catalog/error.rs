//! Error types for catalog import.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::process::ProcessError;

/// Errors that abort the import phase.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The desktop application holds the library; importing would risk corrupting it.
    #[error("desktop application '{process}' is running; close it before importing")]
    DesktopRunning {
        /// The process name that was matched.
        process: String,
    },

    /// The import tool failed or is missing.
    #[error("import tool failed: {source}")]
    Tool {
        /// The process failure.
        #[source]
        source: ProcessError,
    },

    /// The staging directory could not be read.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ImportError {
    /// Creates a `DesktopRunning` error.
    pub fn desktop_running(process: impl Into<String>) -> Self {
        Self::DesktopRunning {
            process: process.into(),
        }
    }

    /// Creates a `Tool` error.
    pub fn tool(source: ProcessError) -> Self {
        Self::Tool { source }
    }

    /// Creates an `Io` error.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true when the import was refused by a precondition.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::DesktopRunning { .. })
    }
}
