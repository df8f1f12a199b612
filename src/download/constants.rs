//! Constants for the download module.

/// HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Overall transfer timeout (5 minutes); a stalled download stalls the run
/// for at most this long.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Write buffer size for streamed transfers.
pub const DOWNLOAD_BUFFER_BYTES: usize = 8192;
