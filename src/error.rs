// src/error.rs
// =============================================================================
// Error types for the crawler library.
//
// Errors come in two severities:
// - Per-URL and per-tool failures (FetchError, HarvestError). These are
//   absorbed where they happen: the crawl logs a warning and moves on.
// - Fatal failures (CrawlError). These stop the whole crawl.
//
// We use the `thiserror` crate to derive std::error::Error and Display.
// The binary (main.rs) uses anyhow on top of these.
//
// Rust concepts:
// - Enums with data: each variant carries the details of one failure mode
// - #[source]: chaining an underlying error as the cause
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

use crate::report::CrawlResult;

/// Why a single HTTP fetch failed.
///
/// This is stored in the status cache, so it must be cheap to clone and
/// cannot hold the original `reqwest::Error` (which is not Clone).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("TLS error: {0}")]
    Tls(String),
    #[error("too many redirects")]
    Redirect,
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    // reqwest errors can happen for many reasons, so sort them into the
    // buckets we report on
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();

        if error.is_timeout() {
            FetchError::Timeout
        } else if error.is_redirect() {
            FetchError::Redirect
        } else if error.is_connect() {
            FetchError::Connect(message)
        } else if error.is_body() || error.is_decode() {
            FetchError::Body(message)
        } else if message.contains("certificate") || message.contains("ssl") {
            FetchError::Tls(message)
        } else {
            FetchError::Request(message)
        }
    }
}

/// Why an external harvester produced nothing.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("could not start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    ExitStatus {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Failures that abort a whole crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid crawl request: {0}")]
    InvalidRequest(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{failed} of {attempted} fetches failed, aborting crawl")]
    FailureRateExceeded { failed: usize, attempted: usize },

    #[error("failed to write results to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A fatal error together with whatever the crawl gathered before it.
///
/// Callers that want all-or-nothing semantics just drop `partial`.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CrawlFailure {
    #[source]
    pub error: CrawlError,
    pub partial: CrawlResult,
}

impl From<CrawlError> for CrawlFailure {
    fn from(error: CrawlError) -> Self {
        CrawlFailure {
            error,
            partial: CrawlResult::default(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
