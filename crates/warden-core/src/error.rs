//! Core error types.

use thiserror::Error;

/// Errors raised when constructing core value types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An agent identifier was empty, too long, or used forbidden characters.
    #[error("invalid agent id '{value}': {reason}")]
    InvalidAgentId {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A string could not be parsed as a memory operation.
    #[error("unknown memory operation: {0}")]
    UnknownOperation(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
