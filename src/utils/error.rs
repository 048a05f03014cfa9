//! Domain error types for the ingestion pipeline
//!
//! Each stage owns a small error enum. Extraction is absent on purpose:
//! field extractors always resolve to a value or a fallback, so they never fail.

use thiserror::Error;

/// Errors raised by the shared HTTP fetch boundary
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection reset, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Non-success status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Body could not be decoded to text
    #[error("Decoding error: {0}")]
    Decode(String),

    /// URL failed to parse or has no host
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Rate limiter quota could not be built from the configuration
    #[error("Invalid rate limit: {0} requests per second")]
    RateLimitInit(u32),
}

impl FetchError {
    /// Classify a reqwest error into timeout vs. generic transport failure
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Whether a later run could succeed for the same URL
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            Self::Decode(_) | Self::InvalidUrl(_) | Self::RateLimitInit(_) => false,
        }
    }
}

/// Errors raised while discovering candidate URLs
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Feed body was fetched but could not be parsed
    #[error("Feed parse error: {0}")]
    Feed(String),

    /// Sitemap XML was malformed
    #[error("Sitemap parse error: {0}")]
    Sitemap(String),

    /// Discovery finished with an empty candidate set
    #[error("No URLs discovered")]
    NoUrlsDiscovered,
}

/// Errors raised by the storage layer
///
/// Unique-constraint violations on `url` are not errors; they surface as
/// [`crate::models::InsertOutcome::Duplicate`].
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Storage could not be reached or opened
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Record rejected before it reached the database
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether the same write could succeed later (busy or locked database)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            Self::Io(_) => true,
            _ => false,
        }
    }
}
