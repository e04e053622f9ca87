//! Error types for commit graph traversal.

use twig_store::StoreError;

/// Errors that can occur while walking the commit graph.
#[derive(Debug, thiserror::Error)]
pub enum DagError {
    /// A commit reachable through a parent edge could not be loaded.
    #[error("broken parent edge from {child}: {source}")]
    BrokenEdge {
        /// The commit holding the edge.
        child: twig_types::ObjectId,
        /// Why the parent could not be loaded.
        source: StoreError,
    },

    /// The starting commit could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience alias for graph results.
pub type DagResult<T> = Result<T, DagError>;
