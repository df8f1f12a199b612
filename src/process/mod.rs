//! External command execution.
//!
//! Every collaborator that is a separate program (`pgrep`, `kill`,
//! `calibredb`, `ebook-convert`, `calibre-server`) is reached through the
//! [`ProcessRunner`] trait so the pipeline can be exercised without them.
//!
//! # Object Safety
//!
//! The trait uses `async_trait` so components can hold an
//! `Arc<dyn ProcessRunner>`.

mod error;

pub use error::ProcessError;

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, instrument};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` when terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Creates an output with the given exit code and stdout.
    #[must_use]
    pub fn with_code(code: i32, stdout: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Returns true for a zero exit code.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `program` to completion and captures its output.
    ///
    /// With `check` set, a non-zero exit becomes [`ProcessError::NonZeroExit`];
    /// otherwise the output is returned whatever the exit status.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        check: bool,
    ) -> Result<CommandOutput, ProcessError>;

    /// Starts `program` in the background without waiting for it.
    async fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), ProcessError>;
}

/// [`ProcessRunner`] backed by real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    #[instrument(skip(self, args), fields(command = %render_command(program, args)))]
    async fn run(
        &self,
        program: &str,
        args: &[String],
        check: bool,
    ) -> Result<CommandOutput, ProcessError> {
        info!("running command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                let error = ProcessError::io(program, e);
                error!(error = %error, "could not start command");
                error
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if check && !result.success() {
            error!(
                code = ?result.code,
                stderr = %result.stderr.trim(),
                "command failed"
            );
            return Err(ProcessError::non_zero_exit(
                program,
                result.code,
                &result.stderr,
            ));
        }

        if !result.stderr.trim().is_empty() {
            debug!(stderr = %result.stderr.trim(), "command wrote to stderr");
        }

        Ok(result)
    }

    #[instrument(skip(self, args), fields(command = %render_command(program, args)))]
    async fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), ProcessError> {
        // The child handle is dropped immediately; tokio reaps it in the background.
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessError::io(program, e))?;
        debug!("spawned detached process");
        Ok(())
    }
}

/// Renders a command line for logs.
#[must_use]
pub fn render_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts borrowed arguments into the owned form [`ProcessRunner`] takes.
#[must_use]
pub fn args<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}
