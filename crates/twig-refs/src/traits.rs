//! The [`RefStore`] trait defining the reference storage interface.

use twig_types::ObjectId;

use crate::error::{RefError, Result};

/// Storage backend for branch pointers and HEAD.
///
/// Implementations must be thread-safe (`Send + Sync`). Writes validate the
/// branch name; reads of unknown branches return `Ok(None)` rather than an
/// error so callers can word their own "no such branch" message.
pub trait RefStore: Send + Sync {
    /// The commit a branch points at.
    fn read_branch(&self, name: &str) -> Result<Option<ObjectId>>;

    /// Create or move a branch.
    fn write_branch(&self, name: &str, target: &ObjectId) -> Result<()>;

    /// Delete a branch. Returns `Ok(true)` if it existed.
    ///
    /// Deleting the branch HEAD names fails with `DeleteCurrentBranch`.
    fn delete_branch(&self, name: &str) -> Result<bool>;

    /// Every branch and its target, sorted by name.
    fn branches(&self) -> Result<Vec<(String, ObjectId)>>;

    /// The branch HEAD names, or `None` before initialization.
    fn head(&self) -> Result<Option<String>>;

    /// Point HEAD at a branch.
    fn set_head(&self, branch: &str) -> Result<()>;

    /// Returns `true` if the branch exists.
    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.read_branch(name)?.is_some())
    }

    /// Create a branch that must not already exist.
    ///
    /// A name may not be a `/`-prefix of another branch or extend one, since
    /// `a` and `a/b` cannot both be stored as files.
    fn create_branch(&self, name: &str, target: &ObjectId) -> Result<()> {
        if self.branch_exists(name)? {
            return Err(RefError::AlreadyExists {
                name: name.to_string(),
            });
        }
        if let Some((other, _)) = self
            .branches()?
            .into_iter()
            .find(|(other, _)| nests(name, other) || nests(other, name))
        {
            return Err(RefError::InvalidBranchName {
                name: name.to_string(),
                reason: format!("conflicts with existing branch '{other}'"),
            });
        }
        self.write_branch(name, target)
    }

    /// The branch HEAD names; an error if HEAD was never set.
    fn current_branch(&self) -> Result<String> {
        self.head()?.ok_or(RefError::HeadUnset)
    }

    /// The commit at the tip of the current branch.
    fn head_commit(&self) -> Result<ObjectId> {
        let branch = self.current_branch()?;
        self.read_branch(&branch)?
            .ok_or(RefError::NotFound { name: branch })
    }
}

/// `true` if `inner` lives under `outer/`.
fn nests(inner: &str, outer: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('/'))
}
