//! Streaming downloads into the staging directory.
//!
//! # Features
//!
//! - Streaming through a bounded write buffer (memory use independent of file size)
//! - One overall timeout per transfer (300s by default)
//! - [`DownloadOutcome`] separates not-found from transient failures
//! - Staging filenames built from author and title ([`acquired_filename`])
//!
//! # Example
//!
//! ```no_run
//! use bookfetch_core::download::{HttpClient, acquired_filename};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let name = acquired_filename("Herbert, Frank", "Dune");
//! let outcome = client
//!     .fetch("https://example.com/get.php?md5=abc", &Path::new("./library").join(name))
//!     .await;
//! println!("completed: {}", outcome.is_completed());
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
mod filename;

pub use client::{DownloadOutcome, HttpClient};
pub use constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_BUFFER_BYTES, DOWNLOAD_TIMEOUT_SECS};
pub use error::DownloadError;
pub use filename::{ACQUIRED_EXTENSION, acquired_filename, sanitize_filename};
