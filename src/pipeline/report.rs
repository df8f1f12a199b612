//! Run bookkeeping.

use std::path::PathBuf;

use crate::catalog::ImportReport;
use crate::parser::QueryKey;

/// Orchestrator states, in the order a full run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Loading history and requests.
    Init,
    /// Computing requests not yet in the ledger.
    Diff,
    /// Searching and downloading each new query.
    PerQueryProcessing,
    /// Importing the staging directory.
    ImportPhase,
    /// Restarting the network service.
    RecoveryPhase,
    /// Finished.
    Done,
}

/// What happened to one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Downloaded into staging.
    Acquired {
        /// Staged file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The target file was already in staging; nothing was downloaded.
    AlreadyStaged(PathBuf),
    /// Too short to search.
    Rejected,
    /// No acceptable match, or the link or file was missing.
    NotFound(String),
    /// A transient failure; the query will be tried again.
    Failed(String),
}

impl QueryOutcome {
    /// Returns true when the query ends with its book in staging.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Acquired { .. } | Self::AlreadyStaged(_))
    }
}

/// How the import phase ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    /// The importer returned normally.
    Completed(ImportReport),
    /// The importer returned an error.
    Failed(String),
    /// The importer panicked.
    Panicked(String),
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Phases entered, in order.
    pub phases: Vec<RunPhase>,
    /// Each processed query with its outcome, in processing order.
    pub outcomes: Vec<(QueryKey, QueryOutcome)>,
    /// Whether the ledger file was written.
    pub ledger_saved: bool,
    /// Import result, when the import phase ran.
    pub import: Option<ImportStatus>,
    /// Whether the service start command launched, when recovery ran.
    pub service_started: Option<bool>,
}

impl RunReport {
    pub(crate) fn enter(&mut self, phase: RunPhase) {
        self.phases.push(phase);
    }

    /// Number of new queries processed.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Queries whose book ended up in staging.
    #[must_use]
    pub fn succeeded(&self) -> Vec<&QueryKey> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(query, _)| query)
            .collect()
    }

    /// Queries that were not found or failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, QueryOutcome::NotFound(_) | QueryOutcome::Failed(_)))
            .count()
    }

    /// Queries rejected before searching.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == QueryOutcome::Rejected)
            .count()
    }

    /// Returns true when `phase` was entered.
    #[must_use]
    pub fn visited(&self, phase: RunPhase) -> bool {
        self.phases.contains(&phase)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key(s: &str) -> QueryKey {
        QueryKey::new(s).unwrap()
    }

    #[test]
    fn test_counts_split_outcomes() {
        let report = RunReport {
            outcomes: vec![
                (key("Dune"), QueryOutcome::Acquired { path: PathBuf::from("a.epub"), bytes: 3 }),
                (key("Emma"), QueryOutcome::AlreadyStaged(PathBuf::from("b.epub"))),
                (key("ab"), QueryOutcome::Rejected),
                (key("Nope"), QueryOutcome::NotFound("no match".into())),
                (key("Flaky"), QueryOutcome::Failed("timeout".into())),
            ],
            ..RunReport::default()
        };
        assert_eq!(report.processed(), 5);
        assert_eq!(report.succeeded().len(), 2);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.rejected(), 1);
    }
}
