//! Error types for the download and normalization layer.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while fetching or normalizing a snapshot batch.
#[derive(Debug, Error)]
pub enum CollectError {
    /// All download attempts were used up without a success response.
    #[error("download failed for {uri}: retries exhausted at {last_attempt}")]
    FetchExhausted {
        /// The endpoint that kept failing.
        uri: String,
        /// When the final attempt was made.
        last_attempt: DateTime<Utc>,
    },

    /// A payload field did not match the expected shape or type.
    ///
    /// Schema errors fail the whole batch; there is no per-row skip.
    #[error("schema error in field '{field}': {detail}")]
    Schema {
        /// The offending field or payload location.
        field: String,
        /// What was wrong with it.
        detail: String,
    },

    /// Transport-level HTTP failure (connection refused, timeout, bad TLS).
    ///
    /// Not retried; the retry loop only covers non-success status codes.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CollectError {
    /// Creates a schema error for a named field.
    pub fn schema(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            detail: detail.into(),
        }
    }

    /// Creates a retry-exhaustion error stamped with the current time.
    #[must_use]
    pub fn fetch_exhausted(uri: impl Into<String>) -> Self {
        Self::FetchExhausted {
            uri: uri.into(),
            last_attempt: Utc::now(),
        }
    }
}

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, CollectError>;
