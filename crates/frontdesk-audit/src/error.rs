//! Audit-related error types.

use thiserror::Error;

/// Errors that can occur when writing audit records.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Durable sink I/O failed.
    #[error("audit sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization failed.
    #[error("audit serialization error: {0}")]
    Serialization(String),
}

/// Result type for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;
