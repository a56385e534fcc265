/// Errors raised while building scan rules.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A rule's pattern did not compile.
    #[error("invalid pattern for rule '{id}': {source}")]
    InvalidPattern {
        /// Rule identifier.
        id: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Result type for scan rule construction.
pub type ScanResult<T> = Result<T, ScanError>;
