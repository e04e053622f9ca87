//! Merge engine for twig.
//!
//! Merging works on whole-file identity: a path's content is its blob id, and
//! no line-level diffing is attempted. The engine is pure with respect to the
//! working tree. It classifies a merge ([`analyze`]) and, for a true
//! three-way merge, produces a [`MergePlan`] the repository layer applies.
//!
//! # Modules
//!
//! - [`plan`] -- Per-path decision table over current, given and split maps
//! - [`conflict`] -- Conflict marker synthesis
//! - [`engine`] -- Fast-path detection and split-point lookup

pub mod conflict;
pub mod engine;
pub mod error;
pub mod plan;

pub use conflict::conflict_content;
pub use engine::{analyze, MergeAnalysis};
pub use error::{MergeError, MergeResult};
pub use plan::{MergeAction, MergePlan};
