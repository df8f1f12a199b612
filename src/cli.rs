//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use bookfetch_core::sync::EventShape;
use clap::{Parser, Subcommand};

/// Fetch requested e-books into a Calibre library.
///
/// Reads the request list, downloads new matches into staging, prepares them
/// for the reader, imports them, and leaves the library server running.
#[derive(Parser, Debug)]
#[command(name = "bookfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/bookfetch/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// What to do (default: run)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// The selected command, `run` when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Process new requests, import them and restart the server
    Run,
    /// Print reader sync events for every book under a directory
    Events(EventsArgs),
    /// Restart the library server
    Restart,
}

/// Arguments for `events`.
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct EventsArgs {
    /// Directory to scan (default: the configured library)
    #[arg(long, value_name = "DIR")]
    pub library: Option<PathBuf>,

    /// Base URL the reader downloads books from
    #[arg(long, value_name = "URL")]
    pub host: String,

    /// Event shape for the reader firmware (v1, v2, v3)
    #[arg(long, default_value = "v3")]
    pub shape: EventShape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["bookfetch"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.config.is_none());
        assert_eq!(args.command(), Command::Run);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["bookfetch", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["bookfetch", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["bookfetch", "run", "--verbose", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["bookfetch", "-q"]).unwrap();
        assert!(args.quiet);

        let args = Args::try_parse_from(["bookfetch", "restart", "--quiet"]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.command(), Command::Restart);
    }

    #[test]
    fn test_cli_config_flag() {
        let args = Args::try_parse_from(["bookfetch", "--config", "/etc/bookfetch.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/bookfetch.toml")));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["bookfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["bookfetch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["bookfetch", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_events_requires_host() {
        let err = Args::try_parse_from(["bookfetch", "events"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_events_defaults_to_v3() {
        let args =
            Args::try_parse_from(["bookfetch", "events", "--host", "http://nas:5000"]).unwrap();
        let Command::Events(events) = args.command() else {
            panic!("expected events command");
        };
        assert_eq!(events.host, "http://nas:5000");
        assert_eq!(events.shape, EventShape::V3);
        assert!(events.library.is_none());
    }

    #[test]
    fn test_cli_events_shape_and_library() {
        let args = Args::try_parse_from([
            "bookfetch",
            "events",
            "--library",
            "/books",
            "--host",
            "http://nas",
            "--shape",
            "v1",
        ])
        .unwrap();
        let Command::Events(events) = args.command() else {
            panic!("expected events command");
        };
        assert_eq!(events.library, Some(PathBuf::from("/books")));
        assert_eq!(events.shape, EventShape::V1);
    }

    #[test]
    fn test_cli_events_rejects_unknown_shape() {
        let err = Args::try_parse_from(["bookfetch", "events", "--host", "h", "--shape", "v9"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
