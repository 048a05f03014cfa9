//! Unified error handling for the newsdesk crate
//!
//! Domain-specific errors live in [`crate::utils::error`]; this module wraps
//! them in a single [`Error`] enum for use across module boundaries.

use std::io;
use thiserror::Error;

pub use crate::utils::error::{DiscoveryError, FetchError, StorageError};

/// Unified error type for the newsdesk crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// URL discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Run-level pipeline failure
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration value rejected by validation
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a run-level pipeline error
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let unified: Error = StorageError::Unavailable("locked".into()).into();
        assert!(matches!(unified, Error::Storage(_)));

        let unified: Error = DiscoveryError::NoUrlsDiscovered.into();
        assert_eq!(unified.to_string(), "Discovery error: No URLs discovered");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("workers must be > 0");
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "Config error: workers must be > 0");
    }
}
