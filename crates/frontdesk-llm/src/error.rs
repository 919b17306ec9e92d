//! LLM-related error types.

use thiserror::Error;

/// Errors that can occur with LLM operations.
///
/// None of these escape the dispatcher; [`crate::LlmDispatcher::generate`]
/// converts them into a failed [`crate::Generation`].
#[derive(Debug, Error)]
pub enum LlmError {
    /// API key not configured.
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured {
        /// Provider name.
        provider: String,
    },

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Provider host unreachable.
    #[error("provider unreachable: {0}")]
    Connection(String),

    /// Request exceeded the provider deadline.
    #[error("provider request timed out")]
    Timeout,

    /// Requested model is not available on the provider.
    #[error("model not available: {model}")]
    ModelNotAvailable {
        /// Model name.
        model: String,
    },

    /// HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
