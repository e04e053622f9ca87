//! Staging area for twig.
//!
//! The index holds the delta between the current commit and the next one:
//! paths staged for addition (with the blob they will point at) and paths
//! staged for removal. A path is never in both maps at once.
//!
//! # Key Types
//!
//! - [`Index`] -- The in-memory staging area (BTreeMap-backed)
//! - [`StageOutcome`] / [`RemoveOutcome`] -- What a staging call changed
//! - [`WorkdirStatus`] -- Result of status computation
//! - [`Change`] -- Kind of unstaged modification

pub mod error;
pub mod index;
pub mod status;

pub use error::{IndexError, IndexResult};
pub use index::{Index, IndexState, RemoveOutcome, StageOutcome};
pub use status::{untracked_paths, Change, StatusEntry, WorkdirStatus};
