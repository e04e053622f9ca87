//! Error types for the merge engine.

use twig_types::ObjectId;

/// Errors that can occur while analyzing a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The two heads share no history.
    #[error("no common ancestor between {current} and {given}")]
    NoSplitPoint { current: ObjectId, given: ObjectId },

    /// Walking the commit graph failed.
    #[error(transparent)]
    Graph(#[from] twig_dag::DagError),

    /// Loading a commit failed.
    #[error(transparent)]
    Store(#[from] twig_store::StoreError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
