//! Error types for subprocess execution.

use thiserror::Error;

/// Errors that can occur running an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be found on `PATH` (or at the given path).
    #[error("command not found: {program}")]
    NotFound {
        /// The program that was invoked.
        program: String,
    },

    /// The command ran but exited unsuccessfully.
    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit {
        /// The program that was invoked.
        program: String,
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// Spawning or waiting on the command failed for another reason.
    #[error("failed to run {program}: {source}")]
    Io {
        /// The program that was invoked.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Creates a `NotFound` error.
    pub fn not_found(program: impl Into<String>) -> Self {
        Self::NotFound {
            program: program.into(),
        }
    }

    /// Creates a `NonZeroExit` error.
    pub fn non_zero_exit(program: impl Into<String>, code: Option<i32>, stderr: &str) -> Self {
        Self::NonZeroExit {
            program: program.into(),
            code,
            stderr: stderr.trim().to_string(),
        }
    }

    /// Creates an IO error, promoting `ErrorKind::NotFound` to [`ProcessError::NotFound`].
    pub fn io(program: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found(program);
        }
        Self::Io {
            program: program.into(),
            source,
        }
    }

    /// Returns true when the binary itself is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}
