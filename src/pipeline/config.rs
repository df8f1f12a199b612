//! Explicit run configuration passed to every pipeline component.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::CatalogSettings;
use crate::convert::DEFAULT_OUTPUT_PROFILE;
use crate::download::DOWNLOAD_TIMEOUT_SECS;
use crate::supervisor::{DEFAULT_SERVER_PORT, DEFAULT_SHUTDOWN_GRACE, ServerSettings};

/// Staging directory name under the base directory.
pub const DEFAULT_STAGING_DIR_NAME: &str = "library";
/// Ledger file name under the base directory.
pub const DEFAULT_LEDGER_FILE_NAME: &str = "processed_queries.txt";
/// Request list file name under the base directory.
pub const DEFAULT_REQUESTS_FILE_NAME: &str = "requests.txt";
/// Run log file name under the base directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "book_fetcher.log";
/// Catalog library location.
pub const DEFAULT_LIBRARY_PATH: &str = "/home/bookuser/calibre_db";
/// Network service executable.
pub const DEFAULT_SERVER_BIN: &str = "/usr/bin/calibre-server";
/// Network service log file.
pub const DEFAULT_SERVER_LOG: &str = "/home/bookuser/calibre-server.log";
/// Import tool executable.
pub const DEFAULT_CALIBREDB_BIN: &str = "calibredb";
/// Desktop application process name.
pub const DEFAULT_DESKTOP_PROCESS: &str = "calibre";
/// Format converter executable.
pub const DEFAULT_CONVERT_BIN: &str = "ebook-convert";
/// Catalog search mirror.
pub const DEFAULT_SEARCH_BASE_URL: &str = "https://libgen.bz";

/// What the ledger records at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LedgerPolicy {
    /// Persist nothing new; every request is reconsidered next run.
    #[default]
    Discard,
    /// Persist history plus this run's successful queries.
    PersistSuccesses,
}

impl LedgerPolicy {
    /// Config-file spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discard => "discard",
            Self::PersistSuccesses => "persist-successes",
        }
    }
}

impl fmt::Display for LedgerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a ledger policy name is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown ledger policy '{0}' (expected \"discard\" or \"persist-successes\")")]
pub struct UnknownLedgerPolicy(pub String);

impl FromStr for LedgerPolicy {
    type Err = UnknownLedgerPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discard" => Ok(Self::Discard),
            "persist-successes" | "persist_successes" => Ok(Self::PersistSuccesses),
            _ => Err(UnknownLedgerPolicy(s.to_string())),
        }
    }
}

/// Everything one run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Request list, one query per line.
    pub requests_file: PathBuf,
    /// Ledger of already-processed queries.
    pub ledger_file: PathBuf,
    /// Catalog search mirror base URL.
    pub search_base_url: String,
    /// Overall transfer timeout per download.
    pub download_timeout: Duration,
    /// Format converter executable.
    pub convert_bin: String,
    /// Converter output profile.
    pub output_profile: String,
    /// Ledger behaviour at the end of a run.
    pub ledger_policy: LedgerPolicy,
    /// Import settings (staging and library locations).
    pub catalog: CatalogSettings,
    /// Network service settings.
    pub server: ServerSettings,
}

impl PipelineConfig {
    /// Builds the default layout rooted at `base_dir`.
    #[must_use]
    pub fn with_base_dir(base_dir: &Path) -> Self {
        let library_path = PathBuf::from(DEFAULT_LIBRARY_PATH);
        Self {
            requests_file: base_dir.join(DEFAULT_REQUESTS_FILE_NAME),
            ledger_file: base_dir.join(DEFAULT_LEDGER_FILE_NAME),
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            download_timeout: Duration::from_secs(DOWNLOAD_TIMEOUT_SECS),
            convert_bin: DEFAULT_CONVERT_BIN.to_string(),
            output_profile: DEFAULT_OUTPUT_PROFILE.to_string(),
            ledger_policy: LedgerPolicy::default(),
            catalog: CatalogSettings {
                staging_dir: base_dir.join(DEFAULT_STAGING_DIR_NAME),
                library_path: library_path.clone(),
                calibredb_bin: DEFAULT_CALIBREDB_BIN.to_string(),
                desktop_process: DEFAULT_DESKTOP_PROCESS.to_string(),
            },
            server: ServerSettings {
                server_bin: DEFAULT_SERVER_BIN.to_string(),
                library_path,
                port: DEFAULT_SERVER_PORT,
                log_path: PathBuf::from(DEFAULT_SERVER_LOG),
                shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            },
        }
    }

    /// Directory downloads are staged in.
    #[must_use]
    pub fn staging_dir(&self) -> &Path {
        &self.catalog.staging_dir
    }

    /// Points both the importer and the service at `library_path`.
    #[must_use]
    pub fn with_library_path(mut self, library_path: impl Into<PathBuf>) -> Self {
        let library_path = library_path.into();
        self.catalog.library_path.clone_from(&library_path);
        self.server.library_path = library_path;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_rooted_at_base_dir() {
        let config = PipelineConfig::with_base_dir(Path::new("/srv/books"));
        assert_eq!(config.staging_dir(), Path::new("/srv/books/library"));
        assert_eq!(
            config.ledger_file,
            PathBuf::from("/srv/books/processed_queries.txt")
        );
        assert_eq!(config.requests_file, PathBuf::from("/srv/books/requests.txt"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.download_timeout, Duration::from_secs(300));
        assert_eq!(config.ledger_policy, LedgerPolicy::Discard);
    }

    #[test]
    fn test_with_library_path_updates_importer_and_server() {
        let config =
            PipelineConfig::with_base_dir(Path::new("/b")).with_library_path("/data/lib");
        assert_eq!(config.catalog.library_path, PathBuf::from("/data/lib"));
        assert_eq!(config.server.library_path, PathBuf::from("/data/lib"));
    }

    #[test]
    fn test_ledger_policy_parses_both_spellings() {
        assert_eq!("discard".parse::<LedgerPolicy>().unwrap(), LedgerPolicy::Discard);
        assert_eq!(
            "Persist-Successes".parse::<LedgerPolicy>().unwrap(),
            LedgerPolicy::PersistSuccesses
        );
        assert!("keep-all".parse::<LedgerPolicy>().is_err());
    }

    #[test]
    fn test_ledger_policy_display_round_trips() {
        for policy in [LedgerPolicy::Discard, LedgerPolicy::PersistSuccesses] {
            assert_eq!(policy.to_string().parse::<LedgerPolicy>().unwrap(), policy);
        }
    }
}
