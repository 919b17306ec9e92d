//! Backend client error types.
//!
//! The variants mirror the runtime's error taxonomy: not-found and auth
//! failures are terminal, server errors and transport failures are retried
//! before surfacing, and rate limits are absorbed by the retry loop.

use thiserror::Error;

/// Errors that can occur talking to the booking backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// 404 from the backend. Never retried.
    #[error("Resource not found")]
    NotFound,

    /// 401 from the backend. Never retried.
    #[error("Authentication failed")]
    AuthFailed,

    /// Request or response timed out (after retries).
    #[error("backend request timed out")]
    Timeout,

    /// Connection could not be established (after retries).
    #[error("backend unreachable: {0}")]
    Connect(String),

    /// Non-success status from the backend, with the server's error field
    /// when it sent one.
    #[error("backend error ({status}): {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Server-provided error message, or a generic fallback.
        message: String,
    },

    /// Response body did not match the expected envelope.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Other transport-level failure.
    #[error("backend transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl BackendError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Connect(_) | Self::Upstream { status: 500..=599, .. }
        )
    }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
