use warden_core::{ActionId, RequestId};
use warden_memory::MemoryError;
use warden_storage::StorageError;

use crate::request::RequestStatus;

/// Errors from the ledger, the detector, and the resume path.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// No request exists with this id.
    #[error("approval request not found: {0}")]
    NotFound(RequestId),

    /// The request has already left the pending state.
    #[error("approval request {id} already resolved as {status}")]
    AlreadyResolved {
        /// The request id.
        id: RequestId,
        /// Its terminal status.
        status: RequestStatus,
    },

    /// No execution engine is registered to receive resume signals.
    #[error("no execution engine registered")]
    EngineUnavailable,

    /// The execution engine rejected or failed a resume signal.
    #[error("resume of action {action_id} failed: {message}")]
    Resume {
        /// The action that could not be resumed.
        action_id: ActionId,
        /// Engine-supplied description.
        message: String,
    },

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal approval system error.
    #[error("internal approval error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApprovalError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e.to_string())
    }
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// The guard a decision failed, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// The request exists and belongs to the caller.
    Ownership,
    /// The request is still pending.
    Pending,
    /// The final content fits the size ceiling.
    Size,
    /// The target path still resolves.
    Path,
}

/// Errors returned synchronously to whoever submitted a decision.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The target path no longer passes validation.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The stored target path.
        path: String,
        /// Which rule rejected it.
        reason: String,
    },

    /// The caller does not own the request.
    #[error("not authorized to decide {request_id}")]
    Unauthorized {
        /// The request the caller tried to decide.
        request_id: RequestId,
    },

    /// No request exists with this id.
    #[error("approval request not found: {0}")]
    RequestNotFound(RequestId),

    /// The request was already decided.
    #[error("approval request {request_id} already resolved as {status}")]
    RequestAlreadyResolved {
        /// The request id.
        request_id: RequestId,
        /// Its terminal status.
        status: RequestStatus,
    },

    /// The content that would be written exceeds the ceiling.
    #[error("content is {size} bytes, exceeding the {max} byte limit")]
    ContentTooLarge {
        /// Size of the rejected content, in bytes.
        size: usize,
        /// The configured ceiling, in bytes.
        max: usize,
    },

    /// The decision was applied and recorded, but the engine could not be
    /// resumed. Retry with `retry_resume`.
    #[error("request {request_id} resolved as {status} but resume failed: {message}")]
    UpstreamResumeFailure {
        /// The resolved request.
        request_id: RequestId,
        /// The status it was resolved with.
        status: RequestStatus,
        /// What went wrong upstream.
        message: String,
    },

    /// `retry_resume` was called on a request that is still pending.
    #[error("approval request {0} is still pending")]
    StillPending(RequestId),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DecisionError {
    /// The guard that produced this error, if it is a guard failure.
    #[must_use]
    pub fn guard(&self) -> Option<Guard> {
        match self {
            Self::Unauthorized { .. } | Self::RequestNotFound(_) => Some(Guard::Ownership),
            Self::RequestAlreadyResolved { .. } => Some(Guard::Pending),
            Self::ContentTooLarge { .. } => Some(Guard::Size),
            Self::InvalidPath { .. } => Some(Guard::Path),
            Self::UpstreamResumeFailure { .. } | Self::StillPending(_) | Self::Storage(_) => None,
        }
    }

    /// Whether the mutation was kept and only the resume needs retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UpstreamResumeFailure { .. })
    }
}

impl From<MemoryError> for DecisionError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::InvalidPath { path, reason } => Self::InvalidPath { path, reason },
            MemoryError::ContentTooLarge { size, max } => Self::ContentTooLarge { size, max },
            MemoryError::NotFound { path } => Self::Storage(format!("memory file vanished: {path}")),
            MemoryError::Storage(e) => Self::Storage(e.to_string()),
        }
    }
}

impl From<ApprovalError> for DecisionError {
    fn from(e: ApprovalError) -> Self {
        match e {
            ApprovalError::NotFound(id) => Self::RequestNotFound(id),
            ApprovalError::AlreadyResolved { id, status } => Self::RequestAlreadyResolved {
                request_id: id,
                status,
            },
            other => Self::Storage(other.to_string()),
        }
    }
}

/// Result type for decision submission.
pub type DecisionResult<T> = Result<T, DecisionError>;
