//! Error types for reference operations.

use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch was not found.
    #[error("branch not found: {name}")]
    NotFound { name: String },

    /// A branch with this name already exists.
    #[error("branch already exists: {name}")]
    AlreadyExists { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// HEAD has never been set.
    #[error("HEAD is not set")]
    HeadUnset,

    /// Cannot delete the currently checked-out branch.
    #[error("cannot delete current branch: {name}")]
    DeleteCurrentBranch { name: String },

    /// A stored ref does not hold a valid commit id.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
