use thiserror::Error;
use twig_dag::DagError;
use twig_index::IndexError;
use twig_merge::MergeError;
use twig_refs::RefError;
use twig_store::StoreError;

/// Broad class of an [`SdkError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The command cannot run in the repository's current state.
    Precondition,
    /// A named commit, branch or file does not exist.
    NotFound,
    /// Stored state is missing or inconsistent.
    Corruption,
    /// The filesystem failed.
    Io,
}

/// Errors from repository operations.
///
/// Precondition and not-found variants display as the message shown to
/// the user.
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("A twig repository already exists in the current directory.")]
    AlreadyInitialized,

    #[error("Not in an initialized twig directory.")]
    NotInitialized,

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No changes added to the commit.")]
    NothingToCommit,

    #[error("No reason to remove the file.")]
    NothingToRemove,

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedInTheWay { paths: Vec<String> },

    #[error("You have uncommitted changes.")]
    UncommittedChanges,

    #[error("Cannot merge a branch with itself.")]
    MergeWithSelf,

    #[error("No need to checkout the current branch.")]
    AlreadyOnBranch,

    #[error("A branch with that name already exists.")]
    BranchExists,

    #[error("Cannot remove the current branch.")]
    RemoveCurrentBranch,

    #[error("Invalid branch name '{name}': {reason}.")]
    InvalidBranchName { name: String, reason: String },

    #[error("Invalid path '{0}'.")]
    InvalidPath(String),

    #[error("Commit id prefix '{prefix}' is ambiguous; {matches} commits match.")]
    AmbiguousCommitId { prefix: String, matches: usize },

    #[error("File does not exist.")]
    FileNotFound,

    #[error("No such branch exists.")]
    NoSuchBranch,

    #[error("A branch with that name does not exist.")]
    BranchNotFound,

    #[error("No commit with that id exists.")]
    NoSuchCommit,

    #[error("File does not exist in that commit.")]
    FileNotInCommit,

    #[error("Found no commit with that message.")]
    NoCommitWithMessage,

    #[error("object store: {0}")]
    Store(#[from] StoreError),

    #[error("commit graph: {0}")]
    Graph(#[from] DagError),

    #[error("merge: {0}")]
    Merge(#[from] MergeError),

    #[error("refs: {0}")]
    Ref(RefError),

    #[error("index: {0}")]
    Index(IndexError),

    #[error("config: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use SdkError::*;
        match self {
            AlreadyInitialized | NotInitialized | EmptyMessage | NothingToCommit
            | NothingToRemove | UntrackedInTheWay { .. } | UncommittedChanges | MergeWithSelf
            | AlreadyOnBranch | BranchExists | RemoveCurrentBranch | InvalidBranchName { .. }
            | InvalidPath(_) | AmbiguousCommitId { .. } => ErrorKind::Precondition,
            FileNotFound | NoSuchBranch | BranchNotFound | NoSuchCommit | FileNotInCommit
            | NoCommitWithMessage => ErrorKind::NotFound,
            Store(StoreError::Io(_)) | Ref(RefError::Io(_)) | Io(_) => ErrorKind::Io,
            Store(_) | Graph(_) | Merge(_) | Ref(_) | Index(_) | Config(_) => ErrorKind::Corruption,
        }
    }

    /// Returns `true` for errors that carry a message meant for the user.
    pub fn is_designed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Precondition | ErrorKind::NotFound)
    }
}

impl From<RefError> for SdkError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::AlreadyExists { .. } => Self::BranchExists,
            RefError::DeleteCurrentBranch { .. } => Self::RemoveCurrentBranch,
            RefError::InvalidBranchName { name, reason } => Self::InvalidBranchName { name, reason },
            RefError::Io(e) => Self::Io(e),
            other => Self::Ref(other),
        }
    }
}

impl From<IndexError> for SdkError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NothingToRemove(_) => Self::NothingToRemove,
            IndexError::InvalidPath(path) => Self::InvalidPath(path),
            other => Self::Index(other),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
