//! Working directory status.
//!
//! Status compares three views of the tree: the current commit's file map,
//! the index, and the working directory (each file reduced to the blob id
//! its content would have).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use twig_store::FileMap;
use twig_types::ObjectId;

use crate::index::Index;

/// Kind of unstaged modification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// The working file differs from what is tracked or staged.
    Modified,
    /// The working file is gone but nothing records its removal.
    Deleted,
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// A single status entry representing an unstaged change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The file path relative to the working tree root.
    pub path: String,
    /// The kind of change.
    pub change: Change,
}

/// Complete status of the working directory. Every list is sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkdirStatus {
    /// Paths staged for addition.
    pub staged: Vec<String>,
    /// Paths staged for removal.
    pub removed: Vec<String>,
    /// Changes not staged for commit.
    pub unstaged: Vec<StatusEntry>,
    /// Files present in the working directory but neither tracked nor staged.
    pub untracked: Vec<String>,
}

impl WorkdirStatus {
    /// Compute status.
    ///
    /// `worktree` maps each working file to the blob id of its current
    /// content.
    pub fn compute(committed: &FileMap, index: &Index, worktree: &BTreeMap<String, ObjectId>) -> Self {
        let mut unstaged = BTreeMap::new();

        for (path, id) in committed {
            match worktree.get(path) {
                Some(now) if now != id && !index.additions().contains_key(path) => {
                    unstaged.insert(path.clone(), Change::Modified);
                }
                None if !index.removals().contains_key(path) => {
                    unstaged.insert(path.clone(), Change::Deleted);
                }
                _ => {}
            }
        }
        for (path, id) in index.additions() {
            match worktree.get(path) {
                Some(now) if now != id => {
                    unstaged.insert(path.clone(), Change::Modified);
                }
                None => {
                    unstaged.insert(path.clone(), Change::Deleted);
                }
                _ => {}
            }
        }

        Self {
            staged: index.additions().keys().cloned().collect(),
            removed: index.removals().keys().cloned().collect(),
            unstaged: unstaged
                .into_iter()
                .map(|(path, change)| StatusEntry { path, change })
                .collect(),
            untracked: untracked_paths(committed, index, worktree.keys().map(String::as_str)),
        }
    }

    /// Returns `true` if there are no changes of any kind.
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.removed.is_empty()
            && self.unstaged.is_empty()
            && self.untracked.is_empty()
    }
}

/// Working paths absent from `committed` and from both index maps, sorted.
pub fn untracked_paths<'a>(
    committed: &FileMap,
    index: &Index,
    worktree: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut paths: Vec<String> = worktree
        .into_iter()
        .filter(|path| !committed.contains_key(*path) && !index.contains(path))
        .map(str::to_string)
        .collect();
    paths.sort();
    paths
}
