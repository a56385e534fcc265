//! Runtime error types.

use thiserror::Error;

/// Errors raised while building or running a [`Warden`](crate::Warden).
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    ConfigError(#[from] warden_config::ConfigError),

    /// A configuration value could not be turned into a domain type.
    #[error("Invalid config value for {field}: {message}")]
    InvalidConfig {
        /// Dotted config path of the field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Storage backend error.
    #[error("Storage error: {0}")]
    StorageError(#[from] warden_storage::StorageError),

    /// Approval machinery error.
    #[error("Approval error: {0}")]
    ApprovalError(#[from] warden_approval::ApprovalError),

    /// Logging could not be set up.
    #[error("Telemetry error: {0}")]
    TelemetryError(#[from] warden_telemetry::TelemetryError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
