//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or caching configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The admin read API could not be reached.
    #[error("admin API request failed: {0}")]
    AdminRequest(#[from] reqwest::Error),

    /// The admin read API answered with a non-success status.
    #[error("admin API returned status {status}")]
    AdminStatus {
        /// HTTP status code.
        status: u16,
    },

    /// A cached or fetched document did not match its schema.
    #[error("config parse error for {key}: {message}")]
    Parse {
        /// Cache key of the offending document.
        key: String,
        /// Parser message.
        message: String,
    },

    /// A configuration value violates an invariant.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// The shared cache failed.
    #[error("shared cache error: {0}")]
    SharedCache(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
