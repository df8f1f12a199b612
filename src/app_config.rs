//! Configuration file loading for run defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use bookfetch_core::pipeline::{DEFAULT_LOG_FILE_NAME, LedgerPolicy, PipelineConfig};

const APP_DIR_NAME: &str = "bookfetch";

/// Values read from the config file. Unset keys fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    /// Root for the staging dir, ledger, request list and run log.
    pub base_dir: Option<PathBuf>,
    /// Where downloads wait for import.
    pub staging_dir: Option<PathBuf>,
    /// Processed-query ledger.
    pub ledger_file: Option<PathBuf>,
    /// Request list.
    pub requests_file: Option<PathBuf>,
    /// Run log appended to alongside the console.
    pub log_file: Option<PathBuf>,
    /// Catalog search mirror.
    pub search_base_url: Option<String>,
    /// Overall timeout per download (1..=3600).
    pub download_timeout_secs: Option<u64>,
    /// Catalog library directory.
    pub library_path: Option<PathBuf>,
    /// Import tool executable.
    pub calibredb_bin: Option<String>,
    /// Desktop application process name.
    pub desktop_process: Option<String>,
    /// Server executable.
    pub server_bin: Option<String>,
    /// Server port.
    pub server_port: Option<u16>,
    /// Server log file.
    pub server_log: Option<PathBuf>,
    /// Pause after stopping the server (0..=60).
    pub shutdown_grace_secs: Option<u64>,
    /// Format converter executable.
    pub convert_bin: Option<String>,
    /// Converter output profile.
    pub output_profile: Option<String>,
    /// What the ledger records after a run.
    pub ledger_policy: Option<LedgerPolicy>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(timeout) = self.download_timeout_secs
            && !(1..=3600).contains(&timeout)
        {
            bail!(
                "Invalid config value for `download_timeout_secs`: {timeout}. Expected range: 1..=3600"
            );
        }
        if let Some(grace) = self.shutdown_grace_secs
            && grace > 60
        {
            bail!("Invalid config value for `shutdown_grace_secs`: {grace}. Expected range: 0..=60");
        }
        if self.server_port == Some(0) {
            bail!("Invalid config value for `server_port`: 0. Expected range: 1..=65535");
        }
        if let Some(url) = &self.search_base_url {
            let parsed = url::Url::parse(url)
                .with_context(|| format!("Invalid config value for `search_base_url`: '{url}'"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                bail!("Invalid config value for `search_base_url`: '{url}'. Expected http or https");
            }
        }
        for (key, value) in [
            ("calibredb_bin", &self.calibredb_bin),
            ("desktop_process", &self.desktop_process),
            ("server_bin", &self.server_bin),
            ("convert_bin", &self.convert_bin),
            ("output_profile", &self.output_profile),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                bail!("Invalid config value for `{key}`: must not be empty");
            }
        }
        Ok(())
    }

    /// Fills unset values from the defaults rooted at `base_dir` (or the default base).
    #[must_use]
    pub fn resolve(&self) -> ResolvedConfig {
        let base_dir = self.base_dir.clone().unwrap_or_else(default_base_dir);
        let mut pipeline = PipelineConfig::with_base_dir(&base_dir);

        if let Some(library) = &self.library_path {
            pipeline = pipeline.with_library_path(library);
        }
        if let Some(staging) = &self.staging_dir {
            pipeline.catalog.staging_dir.clone_from(staging);
        }
        if let Some(ledger) = &self.ledger_file {
            pipeline.ledger_file.clone_from(ledger);
        }
        if let Some(requests) = &self.requests_file {
            pipeline.requests_file.clone_from(requests);
        }
        if let Some(url) = &self.search_base_url {
            pipeline.search_base_url.clone_from(url);
        }
        if let Some(secs) = self.download_timeout_secs {
            pipeline.download_timeout = Duration::from_secs(secs);
        }
        if let Some(bin) = &self.calibredb_bin {
            pipeline.catalog.calibredb_bin.clone_from(bin);
        }
        if let Some(process) = &self.desktop_process {
            pipeline.catalog.desktop_process.clone_from(process);
        }
        if let Some(bin) = &self.server_bin {
            pipeline.server.server_bin.clone_from(bin);
        }
        if let Some(port) = self.server_port {
            pipeline.server.port = port;
        }
        if let Some(log) = &self.server_log {
            pipeline.server.log_path.clone_from(log);
        }
        if let Some(secs) = self.shutdown_grace_secs {
            pipeline.server.shutdown_grace = Duration::from_secs(secs);
        }
        if let Some(bin) = &self.convert_bin {
            pipeline.convert_bin.clone_from(bin);
        }
        if let Some(profile) = &self.output_profile {
            pipeline.output_profile.clone_from(profile);
        }
        if let Some(policy) = self.ledger_policy {
            pipeline.ledger_policy = policy;
        }

        ResolvedConfig {
            log_file: self
                .log_file
                .clone()
                .unwrap_or_else(|| base_dir.join(DEFAULT_LOG_FILE_NAME)),
            verbosity: self.verbosity,
            pipeline,
        }
    }
}

/// Effective settings for one invocation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Library configuration.
    pub pipeline: PipelineConfig,
    /// Run log path.
    pub log_file: PathBuf,
    /// Verbosity from the file, if set.
    pub verbosity: Option<VerbositySetting>,
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Log filter used when neither `RUST_LOG` nor a CLI flag decides.
    #[must_use]
    pub fn filter_level(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Parsed file contents; defaults when no file was read.
    pub config: FileConfig,
    /// Whether a file was actually read.
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/bookfetch/config.toml`
/// 2. `$HOME/.config/bookfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join(APP_DIR_NAME)
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR_NAME)
            .join("config.toml"),
    )
}

/// Resolves the default base directory.
///
/// Priority:
/// 1. `$XDG_DATA_HOME/bookfetch`
/// 2. `$HOME/.local/share/bookfetch`
/// 3. the current directory
#[must_use]
pub fn default_base_dir() -> PathBuf {
    if let Some(xdg_data_home) = env_var_non_empty_os("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data_home).join(APP_DIR_NAME);
    }
    if let Some(home) = env_var_non_empty_os("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR_NAME);
    }
    PathBuf::from(".")
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from `explicit` (which must exist) or from the default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config,
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config,
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: FileConfig::default(),
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "base_dir" => cfg.base_dir = Some(parse_path(value).with_context(invalid)?),
            "staging_dir" => cfg.staging_dir = Some(parse_path(value).with_context(invalid)?),
            "ledger_file" => cfg.ledger_file = Some(parse_path(value).with_context(invalid)?),
            "requests_file" => cfg.requests_file = Some(parse_path(value).with_context(invalid)?),
            "log_file" => cfg.log_file = Some(parse_path(value).with_context(invalid)?),
            "library_path" => cfg.library_path = Some(parse_path(value).with_context(invalid)?),
            "server_log" => cfg.server_log = Some(parse_path(value).with_context(invalid)?),
            "search_base_url" => {
                cfg.search_base_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "calibredb_bin" => {
                cfg.calibredb_bin = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "desktop_process" => {
                cfg.desktop_process = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "server_bin" => {
                cfg.server_bin = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "convert_bin" => {
                cfg.convert_bin = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "output_profile" => {
                cfg.output_profile = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "download_timeout_secs" => {
                cfg.download_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "shutdown_grace_secs" => {
                cfg.shutdown_grace_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "server_port" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let port = u16::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("server_port out of range for u16"))
                    .with_context(invalid)?;
                cfg.server_port = Some(port);
            }
            "ledger_policy" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.ledger_policy = Some(parsed.parse::<LedgerPolicy>().with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_path(raw_value: &str) -> Result<PathBuf> {
    let value = parse_string_literal(raw_value)?;
    if value.trim().is_empty() {
        bail!("Expected a non-empty path");
    }
    Ok(PathBuf::from(value))
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}
