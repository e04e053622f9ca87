//! The core Index structure managing staged entries in memory.
//!
//! The [`Index`] keeps two `BTreeMap<String, ObjectId>` maps: additions and
//! removals. All operations are in-memory; reading files, writing blobs and
//! deleting working-tree files are the caller's job, driven by the outcome
//! each operation returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_store::FileMap;
use twig_types::ObjectId;

use crate::error::{IndexError, IndexResult};

/// What [`Index::stage_addition`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// A new addition entry was recorded. The caller must persist the blob.
    Staged,
    /// The same blob was already staged for this path.
    AlreadyStaged,
    /// The content matches the current commit; any stale entry was dropped.
    MatchesCommitted,
}

/// What [`Index::stage_removal`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The path was only staged for addition; that entry was dropped.
    Unstaged,
    /// The tracked path is now staged for removal. The caller must delete
    /// the working file.
    StagedRemoval(ObjectId),
}

/// On-disk form of the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    pub version: u32,
    pub additions: BTreeMap<String, ObjectId>,
    pub removals: BTreeMap<String, ObjectId>,
}

/// The staging index: pending changes for the next commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    additions: BTreeMap<String, ObjectId>,
    removals: BTreeMap<String, ObjectId>,
}

impl Index {
    /// Version written by [`Index::to_bytes`].
    pub const VERSION: u32 = 1;

    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Paths staged for addition and their blobs.
    pub fn additions(&self) -> &BTreeMap<String, ObjectId> {
        &self.additions
    }

    /// Paths staged for removal and their committed blobs.
    pub fn removals(&self) -> &BTreeMap<String, ObjectId> {
        &self.removals
    }

    /// Returns `true` if `path` appears in either map.
    pub fn contains(&self, path: &str) -> bool {
        self.additions.contains_key(path) || self.removals.contains_key(path)
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Stage `path` to point at blob `id`.
    ///
    /// `committed` is the blob the current commit holds for `path`, if any.
    /// Staging content identical to the committed version undoes staging
    /// instead of recording a no-op change.
    pub fn stage_addition(
        &mut self,
        path: &str,
        id: ObjectId,
        committed: Option<&ObjectId>,
    ) -> IndexResult<StageOutcome> {
        check_path(path)?;

        if self.additions.get(path) == Some(&id) {
            return Ok(StageOutcome::AlreadyStaged);
        }
        self.removals.remove(path);
        if committed == Some(&id) {
            self.additions.remove(path);
            debug!(path, "content matches commit, unstaged");
            return Ok(StageOutcome::MatchesCommitted);
        }
        self.additions.insert(path.to_string(), id);
        debug!(path, blob = %id.short_hex(), "staged addition");
        Ok(StageOutcome::Staged)
    }

    /// Stage `path` for removal.
    ///
    /// A tracked path (`committed` is `Some`) loses any addition entry and is
    /// recorded for removal. An untracked path that was staged for addition
    /// only loses its addition entry. Anything else is `NothingToRemove`.
    pub fn stage_removal(
        &mut self,
        path: &str,
        committed: Option<ObjectId>,
    ) -> IndexResult<RemoveOutcome> {
        if let Some(id) = committed {
            self.additions.remove(path);
            self.removals.insert(path.to_string(), id);
            debug!(path, "staged removal");
            return Ok(RemoveOutcome::StagedRemoval(id));
        }
        if self.additions.remove(path).is_some() {
            debug!(path, "dropped addition");
            return Ok(RemoveOutcome::Unstaged);
        }
        Err(IndexError::NothingToRemove(path.to_string()))
    }

    /// Drop every staged entry.
    pub fn clear(&mut self) {
        self.additions.clear();
        self.removals.clear();
    }

    /// The file map the next commit would hold, starting from `base`.
    ///
    /// Additions are applied before removals.
    pub fn apply_pending(&self, base: &FileMap) -> FileMap {
        let mut files = base.clone();
        for (path, id) in &self.additions {
            files.insert(path.clone(), *id);
        }
        for path in self.removals.keys() {
            files.remove(path);
        }
        files
    }

    // ---------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------

    /// Serialize to bincode.
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        let state = IndexState {
            version: Self::VERSION,
            additions: self.additions.clone(),
            removals: self.removals.clone(),
        };
        bincode::serialize(&state).map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Deserialize from bincode.
    pub fn from_bytes(data: &[u8]) -> IndexResult<Self> {
        let state: IndexState =
            bincode::deserialize(data).map_err(|e| IndexError::Serialization(e.to_string()))?;
        if state.version != Self::VERSION {
            return Err(IndexError::Serialization(format!(
                "unsupported index version {}",
                state.version
            )));
        }
        if let Some(path) = state.additions.keys().find(|p| state.removals.contains_key(*p)) {
            return Err(IndexError::Serialization(format!(
                "path staged for both addition and removal: {path}"
            )));
        }
        Ok(Self {
            additions: state.additions,
            removals: state.removals,
        })
    }
}

fn check_path(path: &str) -> IndexResult<()> {
    if path.is_empty() {
        return Err(IndexError::InvalidPath("empty path".to_string()));
    }
    if path.starts_with('/') || path.split('/').any(|c| c.is_empty() || c == "." || c == "..") {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(())
}
