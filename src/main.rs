//! CLI entry point for bookfetch.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use bookfetch_core::pipeline::{ImportStatus, Pipeline, RunReport};
use bookfetch_core::process::SystemRunner;
use bookfetch_core::supervisor::ServiceSupervisor;
use bookfetch_core::sync::Library;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod app_config;
mod cli;

use app_config::{ResolvedConfig, load_config};
use cli::{Args, Command, EventsArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let loaded = load_config(args.config.as_deref())?;
    let resolved = loaded.config.resolve();

    let log_file_error = init_tracing(&args, &resolved);

    debug!(?args, "CLI arguments parsed");
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "configuration loaded");
    }
    if let Some(reason) = log_file_error {
        warn!(path = %resolved.log_file.display(), error = %reason, "run log unavailable, logging to console only");
    }

    match args.command() {
        Command::Run => run(resolved).await,
        Command::Events(events) => print_events(&resolved, &events),
        Command::Restart => restart(resolved).await,
    }
}

/// Installs the console layer and, when the run log can be opened, a file layer.
///
/// Priority: `RUST_LOG` > `--quiet` > `-v` > config verbosity > info.
/// Returns the reason the run log could not be opened, if it could not.
fn init_tracing(args: &Args, resolved: &ResolvedConfig) -> Option<String> {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => resolved
                .verbosity
                .map_or("info", app_config::VerbositySetting::filter_level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, file_error) = match open_run_log(&resolved.log_file) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(format!("{e:#}"))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    file_error
}

fn open_run_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory '{}'", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file '{}'", path.display()))
}

/// One sweep. Every run-time failure ends up in the log; only config and
/// CLI errors produce a failing exit status.
async fn run(resolved: ResolvedConfig) -> Result<()> {
    info!("bookfetch starting");
    let pipeline = match Pipeline::from_config(resolved.pipeline) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "could not set up the run");
            return Ok(());
        }
    };
    match pipeline.run().await {
        Ok(report) => log_summary(&report),
        Err(e) => error!(error = %e, "run aborted"),
    }
    Ok(())
}

fn log_summary(report: &RunReport) {
    info!(
        processed = report.processed(),
        succeeded = report.succeeded().len(),
        failed = report.failed(),
        rejected = report.rejected(),
        ledger_saved = report.ledger_saved,
        "run finished"
    );
    match &report.import {
        Some(ImportStatus::Completed(outcome)) => info!(?outcome, "import phase completed"),
        Some(ImportStatus::Failed(reason)) => error!(reason = %reason, "import phase failed"),
        Some(ImportStatus::Panicked(reason)) => error!(reason = %reason, "import phase panicked"),
        None => debug!("import phase skipped"),
    }
    if report.service_started == Some(false) {
        error!("library server did not start; start it manually");
    }
}

fn print_events(resolved: &ResolvedConfig, events: &EventsArgs) -> Result<()> {
    let root = events
        .library
        .clone()
        .unwrap_or_else(|| resolved.pipeline.catalog.library_path.clone());
    let library = Library::scan(&root);
    let records = library.sync_events(&events.host, events.shape, &chrono::Utc::now());
    let json = serde_json::to_string_pretty(&records).context("Failed to encode sync events")?;
    println!("{json}");
    Ok(())
}

async fn restart(resolved: ResolvedConfig) -> Result<()> {
    let supervisor = ServiceSupervisor::new(Arc::new(SystemRunner::new()), resolved.pipeline.server);
    if !supervisor.restart().await {
        bail!("library server failed to start");
    }
    Ok(())
}
