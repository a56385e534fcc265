use warden_storage::StorageError;

/// Errors from path resolution and memory store operations.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The logical path failed validation.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The path as supplied by the caller.
        path: String,
        /// Which rule rejected it.
        reason: String,
    },

    /// No memory file exists at the path.
    #[error("memory file not found: {path}")]
    NotFound {
        /// The normalized path.
        path: String,
    },

    /// Content exceeds the configured ceiling.
    #[error("content is {size} bytes, exceeding the {max} byte limit")]
    ContentTooLarge {
        /// Size of the rejected content, in bytes.
        size: usize,
        /// The configured ceiling, in bytes.
        max: usize,
    },

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
