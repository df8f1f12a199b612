//! Durable line-delimited state: the dedup ledger and the request list.
//!
//! Neither file is locked. Both are read once per run and the ledger is
//! written at most once, so correctness relies on a single run at a time.

mod requests;

pub use requests::RequestSource;

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument};

use crate::parser::QueryKey;

/// Persistent set of query keys that have already been processed.
///
/// A key present in the ledger is never passed to the search service again.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Creates a ledger backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads persisted keys, one per line.
    ///
    /// A missing file yields an empty set. Any other read failure is logged
    /// and also yields an empty set; it never aborts the run.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> BTreeSet<QueryKey> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw.lines().filter_map(QueryKey::new).collect(),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("no ledger file yet");
                BTreeSet::new()
            }
            Err(error) => {
                error!(error = %error, "could not load ledger; continuing with empty history");
                BTreeSet::new()
            }
        }
    }

    /// Overwrites the ledger with `keys`, sorted, one per line.
    ///
    /// An empty set is never written. Write failures are logged and reported
    /// through the return value only.
    #[instrument(skip(self, keys), fields(path = %self.path.display(), count = keys.len()))]
    pub fn save(&self, keys: &BTreeSet<QueryKey>) -> bool {
        if keys.is_empty() {
            debug!("nothing to persist; ledger left unchanged");
            return false;
        }

        let body = keys
            .iter()
            .map(QueryKey::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        match std::fs::write(&self.path, body) {
            Ok(()) => {
                info!(count = keys.len(), "saved ledger");
                true
            }
            Err(error) => {
                error!(error = %error, "could not write ledger");
                false
            }
        }
    }
}
