//! Failure taxonomy for a single fetch-and-plot run.
//!
//! None of these are retried; each ends the run with a non-zero exit.

use thiserror::Error;

/// Errors that can occur while fetching, extracting or rendering events.
#[derive(Error, Debug)]
pub enum QuakemapError {
    /// HTTP transport failed (DNS, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status
    #[error("USGS API error (HTTP {status}): {message}")]
    RemoteService { status: u16, message: String },

    /// Body was not valid JSON or lacked expected fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The feed contained no events
    #[error("no earthquake events returned")]
    EmptyDataset,

    /// Writing the output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for QuakemapError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}
