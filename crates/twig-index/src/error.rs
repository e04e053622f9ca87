//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The path is neither staged for addition nor tracked.
    #[error("nothing to remove at path: {0}")]
    NothingToRemove(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
