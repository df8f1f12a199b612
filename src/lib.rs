//! bookfetch core library
//!
//! Turns a plain-text list of wanted books into files in a Calibre library:
//! new requests are searched on a Library Genesis mirror, the first English
//! EPUB match is downloaded into a staging directory, stylesheets that fight
//! the reader's typography are filtered out, the batch is imported with
//! `calibredb`, and the library server is always restarted afterwards.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Query keys and ISBN detection
//! - [`ledger`] - Processed-query ledger and the request list
//! - [`resolver`] - Catalog search and candidate matching
//! - [`download`] - Streaming downloads into staging
//! - [`convert`] - Reader-compatibility transform
//! - [`process`] - External command execution
//! - [`supervisor`] - Library server stop/start
//! - [`catalog`] - Safety-gated import
//! - [`pipeline`] - The run state machine
//! - [`sync`] - Reader sync events for a book directory

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod convert;
pub mod download;
pub mod ledger;
mod markup;
pub mod parser;
pub mod pipeline;
pub mod process;
pub mod resolver;
pub mod supervisor;
pub mod sync;
mod user_agent;

// Re-export commonly used types
pub use catalog::{CatalogImporter, CatalogSettings, ImportError, ImportReport};
pub use convert::{CompatibilityTransformer, TransformError, TransformOutcome};
pub use download::{DownloadError, DownloadOutcome, HttpClient, acquired_filename, sanitize_filename};
pub use ledger::{Ledger, RequestSource};
pub use parser::{QueryKey, QueryKind, is_isbn};
pub use pipeline::{
    ImportStatus, LedgerPolicy, Pipeline, PipelineConfig, PipelineError, QueryOutcome, RunPhase,
    RunReport,
};
pub use process::{CommandOutput, ProcessError, ProcessRunner, SystemRunner};
pub use resolver::{CatalogSearch, Candidate, LibgenClient, MatchOutcome, MatchResolver, SearchError, SearchFilters};
pub use supervisor::{ServerSettings, ServiceSupervisor};
pub use sync::{EventShape, Library, SyncBook, SyncEvent};
