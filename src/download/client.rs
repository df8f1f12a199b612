//! HTTP client wrapper for streaming downloads into staging.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_BUFFER_BYTES, DOWNLOAD_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Result of one download attempt.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The file was written completely.
    Completed {
        /// Where the file was written.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The server reported the file missing (404/410).
    NotFound {
        /// The status-bearing error.
        error: DownloadError,
    },
    /// Any other failure; the query is retried next run.
    Transient {
        /// What went wrong.
        error: DownloadError,
    },
}

impl DownloadOutcome {
    /// Returns true when the file was written.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// HTTP client for downloading files.
///
/// Created once per run and reused, taking advantage of connection pooling.
/// No retries are attempted; a failed download is simply retried on the
/// next run.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default 300 second overall timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
    }

    /// Creates a client with an explicit overall transfer timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the HTTP client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent::default_download_user_agent())
            .build()
            .map_err(|e| DownloadError::client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Downloads `url` into `dest`, classifying the result.
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn fetch(&self, url: &str, dest: &Path) -> DownloadOutcome {
        info!("downloading");
        match self.download_to_path(url, dest).await {
            Ok(bytes) => {
                info!(bytes, "download complete");
                DownloadOutcome::Completed {
                    path: dest.to_path_buf(),
                    bytes,
                }
            }
            Err(error) if error.is_not_found() => {
                warn!(error = %error, "download target not found");
                DownloadOutcome::NotFound { error }
            }
            Err(error) => {
                warn!(error = %error, "failed to complete download");
                DownloadOutcome::Transient { error }
            }
        }
    }

    /// Streams `url` into the file at `dest`, returning bytes written.
    ///
    /// The destination is created (or truncated) only after a successful
    /// response status. If the transfer fails midway, whatever was written
    /// stays on disk.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the request fails, the
    /// server returns a non-2xx status, or writing to disk fails.
    pub async fn download_to_path(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        stream_to_file(file, response, url, dest).await
    }
}

/// Streams the response body through a bounded write buffer.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(DOWNLOAD_BUFFER_BYTES, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    debug!(bytes = bytes_written, "flushed download");
    Ok(bytes_written)
}
