//! Lifecycle control for the library's network service.
//!
//! The service is found by matching its executable path together with the
//! library path on the process command line, so only the instance serving
//! this library is touched. Stopping and starting never fail the caller:
//! problems are logged and the next run tries again.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::process::{ProcessRunner, args};

/// Default port the service listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default pause after terminating a running instance.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// How to find and launch the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Path of the server executable.
    pub server_bin: String,
    /// Library the server serves.
    pub library_path: PathBuf,
    /// Listening port.
    pub port: u16,
    /// Log file handed to the daemonized server.
    pub log_path: PathBuf,
    /// Pause after killing instances, letting them release the library.
    pub shutdown_grace: Duration,
}

impl ServerSettings {
    /// Pattern matched against full command lines by `pgrep -f`.
    #[must_use]
    pub fn match_pattern(&self) -> String {
        format!("{}.*{}", self.server_bin, self.library_path.display())
    }

    /// Arguments the server is launched with.
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        args([
            self.library_path.to_string_lossy().into_owned(),
            "--port".to_string(),
            self.port.to_string(),
            "--daemonize".to_string(),
            "--log".to_string(),
            self.log_path.to_string_lossy().into_owned(),
        ])
    }
}

/// Stops, starts and restarts the library's server.
#[derive(Clone)]
pub struct ServiceSupervisor {
    runner: Arc<dyn ProcessRunner>,
    settings: ServerSettings,
}

impl std::fmt::Debug for ServiceSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceSupervisor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ServiceSupervisor {
    /// Creates a supervisor.
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: ServerSettings) -> Self {
        Self { runner, settings }
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Terminates every running instance serving this library.
    ///
    /// Returns how many instances were sent a termination signal. Waits for
    /// the shutdown grace period when that count is non-zero.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> usize {
        let pattern = self.settings.match_pattern();
        let listing = match self
            .runner
            .run("pgrep", &args(["-f", pattern.as_str()]), false)
            .await
        {
            Ok(output) => output,
            Err(error) => {
                error!(error = %error, "could not list server processes");
                return 0;
            }
        };

        let pids: Vec<&str> = listing
            .stdout
            .split_whitespace()
            .filter(|pid| pid.chars().all(|c| c.is_ascii_digit()))
            .collect();
        if pids.is_empty() {
            debug!("no running server found");
            return 0;
        }

        let mut killed = 0;
        for pid in pids {
            match self.runner.run("kill", &args([pid]), false).await {
                Ok(output) if output.success() => {
                    info!(pid, "stopped server process");
                    killed += 1;
                }
                Ok(output) => {
                    warn!(pid, code = ?output.code, stderr = %output.stderr.trim(), "kill did not succeed");
                }
                Err(error) => warn!(pid, error = %error, "could not run kill"),
            }
        }

        if killed > 0 && !self.settings.shutdown_grace.is_zero() {
            debug!(grace = ?self.settings.shutdown_grace, "waiting for server shutdown");
            tokio::time::sleep(self.settings.shutdown_grace).await;
        }
        killed
    }

    /// Launches the server detached from this process.
    ///
    /// Returns true when the launch command was started. Failures are logged
    /// and not retried.
    #[instrument(skip(self), fields(port = self.settings.port))]
    pub async fn start(&self) -> bool {
        match self
            .runner
            .spawn_detached(&self.settings.server_bin, &self.settings.launch_args())
            .await
        {
            Ok(()) => {
                info!(log = %self.settings.log_path.display(), "server started");
                true
            }
            Err(error) => {
                error!(error = %error, "failed to start server");
                false
            }
        }
    }

    /// Stops any running instance, then starts a fresh one.
    pub async fn restart(&self) -> bool {
        info!("restarting server");
        let stopped = self.stop().await;
        debug!(stopped, "stop phase finished");
        self.start().await
    }
}
