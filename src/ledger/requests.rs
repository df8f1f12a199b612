//! The operator's request list.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::parser::{QueryKey, parse_request_lines};

/// Line-delimited list of wanted queries.
#[derive(Debug, Clone)]
pub struct RequestSource {
    path: PathBuf,
}

impl RequestSource {
    /// Creates a source reading the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current set of wanted queries.
    ///
    /// A missing or unreadable file is reported and yields an empty set,
    /// which leaves the pipeline with nothing to do.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> BTreeSet<QueryKey> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let keys = parse_request_lines(&raw);
                info!(count = keys.len(), "loaded request list");
                keys
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                error!("requests file not found");
                BTreeSet::new()
            }
            Err(error) => {
                error!(error = %error, "could not read requests file");
                BTreeSet::new()
            }
        }
    }
}
