//! Commit graph for twig.
//!
//! Commits form a DAG through their parent and merge-parent edges. The graph
//! is never materialized: [`CommitGraph`] walks it lazily by loading commits
//! from an [`ObjectStore`](twig_store::ObjectStore), which keeps it in step
//! with whatever the store holds.

pub mod error;
pub mod graph;

pub use error::{DagError, DagResult};
pub use graph::CommitGraph;
