//! Error types for the serp-harvest crate.
//!
//! Batch-level errors ([`CrawlError`]) abort a crawl before any work starts.
//! Per-query fetch failures ([`FetchError`]) are isolated by the aggregator
//! and recorded in the batch instead of being propagated. The proxy token
//! never appears in error messages.

use std::time::Duration;

/// Errors that abort a crawl, snapshot, or export operation.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// A required setting is absent or invalid (missing token, bad selector, ...).
    #[error("config error: {0}")]
    Config(String),

    /// The crawl request itself is invalid (no usable queries, zero limit).
    #[error("validation error: {0}")]
    Validation(String),

    /// A single proxy fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Reading or writing a snapshot or export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV export failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// A failed request to the fetch/render proxy for one query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The proxy answered with a status other than 200.
    #[error("proxy returned HTTP {status}")]
    Status {
        /// The HTTP status code returned by the proxy.
        status: u16,
    },

    /// The request could not be sent or the body could not be read.
    #[error("proxy request failed: {cause}")]
    Transport {
        /// Human-readable description of the underlying failure.
        cause: String,
    },

    /// No response arrived within the per-query timeout.
    #[error("proxy request timed out after {elapsed:?}")]
    Timeout {
        /// The timeout that elapsed.
        elapsed: Duration,
    },
}

impl FetchError {
    /// Whether retrying the same request might succeed.
    ///
    /// Rate limiting (429), server errors (5xx), timeouts and transport
    /// failures are transient. Other statuses (401, 404, ...) are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status } => *status == 429 || (500..600).contains(status),
            Self::Transport { .. } | Self::Timeout { .. } => true,
        }
    }
}

/// Convenience type alias for serp-harvest results.
pub type Result<T> = std::result::Result<T, CrawlError>;
