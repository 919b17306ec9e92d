//! Retrieval error types.

use thiserror::Error;

/// Errors that can occur during retrieval or ingestion.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The vector store rejected a request.
    #[error("vector store error: {0}")]
    Store(String),

    /// Transport-level failure reaching the vector store.
    #[error("vector store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The per-query deadline elapsed.
    #[error("vector store query timed out")]
    Timeout,

    /// A store response did not match the expected shape.
    #[error("invalid vector store response: {0}")]
    InvalidResponse(String),
}

/// Result type for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
