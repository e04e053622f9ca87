use twig_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was never written.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },
}

impl StoreError {
    /// Returns `true` if this error means the repository is damaged, as
    /// opposed to a transient I/O failure.
    pub fn is_corruption(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
