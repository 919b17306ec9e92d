//! Runtime error types.
//!
//! These follow the error taxonomy the actions work with. None of them
//! reach the NLU front-end: the runtime's containment policy converts
//! anything an action returns into an audit record plus a single
//! user-facing message.

use thiserror::Error;

/// Errors an action can surface to the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A required slot is missing when a terminal action runs.
    #[error("missing slot: {slot}")]
    MissingSlot {
        /// Slot name.
        slot: String,
    },

    /// The backend failed.
    #[error(transparent)]
    Backend(#[from] frontdesk_backend::BackendError),

    /// Retrieval failed.
    #[error(transparent)]
    Retrieval(#[from] frontdesk_retrieval::RetrievalError),

    /// No action is registered under the requested name.
    #[error("unknown action: {name}")]
    UnknownAction {
        /// Action name.
        name: String,
    },

    /// Anything else unexpected.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
