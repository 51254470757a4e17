//! Network side of the launcher: HTTP client construction, streaming
//! downloads with fractional progress, and bulletin fetches.
//!
//! Everything here is async and returns [`NetError`]; turning failures
//! into user-facing job results is the caller's job.

mod bulletin;
mod client;
mod download;

#[cfg(test)]
pub(crate) mod testing;

pub use bulletin::{BulletinFetcher, truncate_chars};
pub use client::{DEFAULT_USER_AGENT, HttpConfig, build_client};
pub use download::{CHUNK_SIZE, DownloadSummary, Downloader, part_path};

/// Errors produced by network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("incomplete body: expected {expected} bytes, received {received}")]
    Incomplete { expected: u64, received: u64 },
}
