//! The periodic sweep: requests in, books imported, service back up.
//!
//! # States
//!
//! `Init → Diff → PerQueryProcessing → ImportPhase → RecoveryPhase → Done`
//!
//! An empty diff goes straight to `Done` without touching the service.
//! Otherwise the recovery phase (a service restart) always runs after the
//! import phase, whether the import succeeded, returned an error or panicked.

mod config;
mod error;
mod report;

pub use config::{
    DEFAULT_CALIBREDB_BIN, DEFAULT_CONVERT_BIN, DEFAULT_DESKTOP_PROCESS, DEFAULT_LEDGER_FILE_NAME,
    DEFAULT_LIBRARY_PATH, DEFAULT_LOG_FILE_NAME, DEFAULT_REQUESTS_FILE_NAME,
    DEFAULT_SEARCH_BASE_URL, DEFAULT_SERVER_BIN, DEFAULT_SERVER_LOG, DEFAULT_STAGING_DIR_NAME,
    LedgerPolicy, PipelineConfig, UnknownLedgerPolicy,
};
pub use error::PipelineError;
pub use report::{ImportStatus, QueryOutcome, RunPhase, RunReport};

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{error, info, instrument, warn};

use crate::catalog::CatalogImporter;
use crate::convert::CompatibilityTransformer;
use crate::download::{DownloadOutcome, HttpClient, acquired_filename};
use crate::ledger::{Ledger, RequestSource};
use crate::parser::QueryKey;
use crate::process::{ProcessRunner, SystemRunner};
use crate::resolver::{CatalogSearch, LibgenClient, MatchOutcome, MatchResolver};
use crate::supervisor::ServiceSupervisor;

/// One configured sweep.
pub struct Pipeline {
    config: PipelineConfig,
    ledger: Ledger,
    requests: RequestSource,
    resolver: MatchResolver,
    downloader: HttpClient,
    importer: CatalogImporter,
    supervisor: Arc<ServiceSupervisor>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Wires a pipeline from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DownloadSetup`] if the HTTP client cannot be built.
    pub fn new(
        config: PipelineConfig,
        search: Arc<dyn CatalogSearch>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self, PipelineError> {
        let downloader =
            HttpClient::with_timeout(config.download_timeout).map_err(PipelineError::download_setup)?;
        let supervisor = Arc::new(ServiceSupervisor::new(
            Arc::clone(&runner),
            config.server.clone(),
        ));
        let transformer = CompatibilityTransformer::new(
            Arc::clone(&runner),
            config.convert_bin.clone(),
            config.output_profile.clone(),
        );
        let importer = CatalogImporter::new(
            runner,
            Arc::clone(&supervisor),
            transformer,
            config.catalog.clone(),
        );

        Ok(Self {
            ledger: Ledger::new(&config.ledger_file),
            requests: RequestSource::new(&config.requests_file),
            resolver: MatchResolver::new(search),
            downloader,
            importer,
            supervisor,
            config,
        })
    }

    /// Wires a pipeline against the real search mirror and real processes.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if either HTTP client cannot be built.
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let search = LibgenClient::with_base_url(&config.search_base_url)
            .map_err(PipelineError::search_setup)?;
        Self::new(config, Arc::new(search), Arc::new(SystemRunner::new()))
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the service supervisor.
    #[must_use]
    pub fn supervisor(&self) -> &ServiceSupervisor {
        &self.supervisor
    }

    /// Runs one sweep.
    ///
    /// Per-query and import failures are recorded in the report rather than
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Staging`] if the staging directory cannot be created.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        report.enter(RunPhase::Init);
        let staging = self.config.staging_dir();
        tokio::fs::create_dir_all(staging)
            .await
            .map_err(|e| PipelineError::staging(staging, e))?;

        info!(path = %self.requests.path().display(), "loading request list");
        let history = self.ledger.load();
        info!(count = history.len(), "loaded previously processed queries");
        let requested = self.requests.load();

        report.enter(RunPhase::Diff);
        let new_queries: Vec<QueryKey> = requested.difference(&history).cloned().collect();
        if new_queries.is_empty() {
            info!("no new queries since the last run");
            report.enter(RunPhase::Done);
            return Ok(report);
        }
        info!(count = new_queries.len(), "found new queries to process");

        report.enter(RunPhase::PerQueryProcessing);
        for query in new_queries {
            let outcome = self.process_query(&query).await;
            report.outcomes.push((query, outcome));
        }
        info!(
            succeeded = report.succeeded().len(),
            failed = report.failed(),
            rejected = report.rejected(),
            "query processing finished"
        );

        let successes: BTreeSet<QueryKey> = report.succeeded().into_iter().cloned().collect();
        report.ledger_saved = self.persist_ledger(&history, &successes);

        report.enter(RunPhase::ImportPhase);
        report.import = Some(self.import_phase().await);

        report.enter(RunPhase::RecoveryPhase);
        report.service_started = Some(self.supervisor.restart().await);

        report.enter(RunPhase::Done);
        Ok(report)
    }

    /// Resolves, matches and downloads one query into staging.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn process_query(&self, query: &QueryKey) -> QueryOutcome {
        info!("processing query");
        if !query.is_searchable() {
            warn!("query too short for search");
            return QueryOutcome::Rejected;
        }

        let candidate = match self.resolver.find_candidate(query).await {
            MatchOutcome::Found(candidate) => candidate,
            MatchOutcome::NotFound(reason) => {
                info!(reason = %reason, "no English EPUB available");
                return QueryOutcome::NotFound(reason);
            }
            MatchOutcome::Transient(error) => {
                error!(error = %error, "search failed");
                return QueryOutcome::Failed(error.to_string());
            }
        };

        let dest = self
            .config
            .staging_dir()
            .join(acquired_filename(&candidate.author, &candidate.title));
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            info!(path = %dest.display(), "already downloaded");
            return QueryOutcome::AlreadyStaged(dest);
        }

        info!(title = %candidate.title, author = %candidate.author, "resolving download link");
        let link = match self.resolver.resolve_link(&candidate).await {
            MatchOutcome::Found(link) => link,
            MatchOutcome::NotFound(reason) => {
                error!(reason = %reason, "could not resolve a download link");
                return QueryOutcome::NotFound(reason);
            }
            MatchOutcome::Transient(error) => {
                error!(error = %error, "link resolution failed");
                return QueryOutcome::Failed(error.to_string());
            }
        };

        match self.downloader.fetch(&link, &dest).await {
            DownloadOutcome::Completed { path, bytes } => QueryOutcome::Acquired { path, bytes },
            DownloadOutcome::NotFound { error } => QueryOutcome::NotFound(error.to_string()),
            DownloadOutcome::Transient { error } => QueryOutcome::Failed(error.to_string()),
        }
    }

    fn persist_ledger(&self, history: &BTreeSet<QueryKey>, successes: &BTreeSet<QueryKey>) -> bool {
        let updated = match self.config.ledger_policy {
            LedgerPolicy::Discard => BTreeSet::new(),
            LedgerPolicy::PersistSuccesses => history.union(successes).cloned().collect(),
        };
        info!(policy = %self.config.ledger_policy, count = updated.len(), "updating ledger");
        self.ledger.save(&updated)
    }

    /// Runs the importer, converting both errors and panics into a status.
    async fn import_phase(&self) -> ImportStatus {
        info!("starting catalog sync");
        match AssertUnwindSafe(self.importer.import_staging())
            .catch_unwind()
            .await
        {
            Ok(Ok(report)) => ImportStatus::Completed(report),
            Ok(Err(error)) => {
                error!(error = %error, "catalog import failed");
                ImportStatus::Failed(error.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(panic = %message, "catalog import panicked");
                ImportStatus::Panicked(message)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_reads_common_payloads() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
