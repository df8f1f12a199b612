//! Safety-gated import of staged books into the catalog library.
//!
//! # Procedure
//!
//! 1. Nothing staged: report and return without side effects.
//! 2. Desktop application running: refuse without side effects.
//! 3. Stop the network service and clear a stale library lock.
//! 4. Apply the reader-compatibility transform to every staged EPUB.
//! 5. Run the import tool over the staging directory.
//! 6. On success, empty the staging directory.
//!
//! The service is deliberately not restarted here; the caller owns that.

mod error;

pub use error::ImportError;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::convert::{CompatibilityTransformer, TransformOutcome};
use crate::download::ACQUIRED_EXTENSION;
use crate::process::{ProcessRunner, args};
use crate::supervisor::ServiceSupervisor;

/// Lock file the catalog leaves behind when it is not shut down cleanly.
pub const LIBRARY_LOCK_FILE: &str = "metadata.db.lock";

/// Where and how to import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Directory holding downloaded books awaiting import.
    pub staging_dir: PathBuf,
    /// Catalog library directory.
    pub library_path: PathBuf,
    /// Import tool executable.
    pub calibredb_bin: String,
    /// Exact process name of the desktop application.
    pub desktop_process: String,
}

/// Result of a completed import phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportReport {
    /// Staging held no EPUBs.
    NothingToImport,
    /// The import tool accepted the staged books.
    Imported {
        /// Number of EPUBs handed to the import tool.
        files: usize,
        /// How many of them were converted first.
        converted: usize,
    },
}

/// Imports the staging directory into the library.
#[derive(Clone)]
pub struct CatalogImporter {
    runner: Arc<dyn ProcessRunner>,
    supervisor: Arc<ServiceSupervisor>,
    transformer: CompatibilityTransformer,
    settings: CatalogSettings,
}

impl std::fmt::Debug for CatalogImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogImporter")
            .field("supervisor", &self.supervisor)
            .field("transformer", &self.transformer)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CatalogImporter {
    /// Creates an importer.
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        supervisor: Arc<ServiceSupervisor>,
        transformer: CompatibilityTransformer,
        settings: CatalogSettings,
    ) -> Self {
        Self {
            runner,
            supervisor,
            transformer,
            settings,
        }
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    /// Runs the import procedure over the staging directory.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::DesktopRunning`] when the desktop application is
    /// open, [`ImportError::Tool`] when the import tool fails (staging is left
    /// untouched), and [`ImportError::Io`] when staging cannot be listed.
    #[instrument(skip(self), fields(staging = %self.settings.staging_dir.display()))]
    pub async fn import_staging(&self) -> Result<ImportReport, ImportError> {
        let staged = staged_epubs(&self.settings.staging_dir).await?;
        if staged.is_empty() {
            info!("no new files to import");
            return Ok(ImportReport::NothingToImport);
        }
        info!(count = staged.len(), "importing staged files");

        if self.desktop_running().await {
            error!(
                process = %self.settings.desktop_process,
                "desktop application is running; close it before importing"
            );
            return Err(ImportError::desktop_running(&self.settings.desktop_process));
        }

        let stopped = self.supervisor.stop().await;
        info!(stopped, "server is stopped for import");
        self.remove_stale_lock().await;

        let mut converted = 0;
        for path in &staged {
            if self.transformer.transform(path).await == TransformOutcome::Converted {
                converted += 1;
            }
        }
        info!(converted, "compatibility pass complete");

        let staging = self.settings.staging_dir.to_string_lossy();
        let library = self.settings.library_path.to_string_lossy();
        let command = args([
            "add",
            &*staging,
            "--with-library",
            &*library,
            "--recurse",
        ]);
        self.runner
            .run(&self.settings.calibredb_bin, &command, true)
            .await
            .map_err(|e| {
                error!(error = %e, "catalog import failed");
                ImportError::tool(e)
            })?;
        info!("import successful");

        clear_staging(&self.settings.staging_dir).await;

        Ok(ImportReport::Imported {
            files: staged.len(),
            converted,
        })
    }

    /// Returns true when an exact-name match for the desktop process exists.
    async fn desktop_running(&self) -> bool {
        match self
            .runner
            .run("pgrep", &args(["-x", self.settings.desktop_process.as_str()]), false)
            .await
        {
            Ok(output) => output.success(),
            Err(error) => {
                warn!(error = %error, "could not check for desktop application, assuming closed");
                false
            }
        }
    }

    async fn remove_stale_lock(&self) {
        let lock = self.settings.library_path.join(LIBRARY_LOCK_FILE);
        match tokio::fs::remove_file(&lock).await {
            Ok(()) => info!(path = %lock.display(), "removed stale library lock"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %lock.display(), error = %e, "could not remove library lock"),
        }
    }
}

/// Lists the EPUBs directly inside `staging`, sorted by path.
///
/// A missing staging directory holds nothing.
///
/// # Errors
///
/// Returns [`ImportError::Io`] if the directory exists but cannot be read.
pub async fn staged_epubs(staging: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let mut entries = match tokio::fs::read_dir(staging).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ImportError::io(staging, e)),
    };

    let mut staged = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ImportError::io(staging, e))?
    {
        let path = entry.path();
        let is_epub = path
            .extension()
            .is_some_and(|ext| ext == ACQUIRED_EXTENSION);
        if is_epub && path.is_file() {
            staged.push(path);
        }
    }
    staged.sort();
    Ok(staged)
}

/// Deletes every file and directory inside `staging`, logging per-item failures.
async fn clear_staging(staging: &Path) {
    let mut entries = match tokio::fs::read_dir(staging).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %staging.display(), error = %e, "could not list staging for cleanup");
            return;
        }
    };

    let mut removed = 0usize;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(path = %staging.display(), error = %e, "staging listing interrupted");
                break;
            }
        };
        let path = entry.path();
        let result = match entry.file_type().await {
            Ok(kind) if kind.is_dir() => tokio::fs::remove_dir_all(&path).await,
            Ok(_) => tokio::fs::remove_file(&path).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "could not delete staged item"),
        }
    }
    debug!(removed, "staging cleaned");
}
