//! High-level SDK for twig.
//!
//! [`Repository`] is the single handle every command goes through. It owns
//! the four stores of a repository (objects, refs, index, working tree) and
//! enforces the safety checks that keep them consistent: nothing is written
//! until every precondition of an operation has been validated.

pub mod config;
pub mod error;
pub mod layout;
pub mod repository;
pub mod worktree;

pub use config::RepoConfig;
pub use error::{ErrorKind, SdkError, SdkResult};
pub use layout::Layout;
pub use repository::{MergeReport, RepoStatus, Repository};
pub use worktree::Worktree;

// Re-export key types
pub use twig_index::{Change, RemoveOutcome, StageOutcome, StatusEntry, WorkdirStatus};
pub use twig_store::{Blob, Commit, FileMap};
pub use twig_types::ObjectId;
