//! Error types for the scraper pipeline.
//!
//! The taxonomy mirrors the pipeline's failure boundaries:
//! - [`ConfigError`]: rejected before any fetching begins
//! - [`FetchError`]: a single page could not be retrieved; recorded per-page
//!   by the orchestrator and never fatal to a run on its own
//! - [`SourceError`]: transport-level failure from a [`PageSource`]
//! - [`StorageError`]: persistence failures in the storage collaborator
//!
//! [`PageSource`]: crate::scraper::fetch::PageSource

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration rejected at startup, before the first request.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The rate limit interval must be zero or positive.
    #[error("rate limit must not be negative (got {0})")]
    NegativeRateLimit(f64),

    /// Concurrent mode needs at least one worker.
    #[error("concurrency width must be at least 1")]
    ZeroConcurrency,

    /// The fetcher must be allowed at least one attempt per page.
    #[error("max attempts must be at least 1")]
    ZeroAttempts,

    /// The listing base URL did not parse.
    #[error("invalid base URL {url:?}: {reason}")]
    BadBaseUrl { url: String, reason: String },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Classification of a failed page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchErrorKind {
    /// Connection failures and 5xx responses that survived all retries.
    Unreachable,
    /// A 4xx response; the server answered and said no, so retrying is pointless.
    Blocked,
    /// The request exceeded the configured timeout on every attempt.
    Timeout,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorKind::Unreachable => "unreachable",
            FetchErrorKind::Blocked => "blocked",
            FetchErrorKind::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// A page fetch that failed after retries were exhausted (or short-circuited
/// on a 4xx). Carried in the run report, never raised past the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("page {page} fetch failed after {attempts} attempt(s): {kind}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub page: u32,
    pub attempts: u32,
}

/// Transport-level failure reported by a [`PageSource`] implementation.
///
/// Non-2xx statuses are *not* errors at this layer; the fetcher classifies
/// them so that retry policy lives in one place.
///
/// [`PageSource`]: crate::scraper::fetch::PageSource
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
}

/// Failures in the JSON file storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failure at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("stored stories are not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StorageError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
