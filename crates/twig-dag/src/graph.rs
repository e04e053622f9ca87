//! Ancestry queries over stored commits.
//!
//! # Invariants
//!
//! - Every traversal marks a commit visited when it is enqueued, so a commit
//!   with many descendants is expanded exactly once.
//! - Edges are followed parent first, then merge parent. Every result that
//!   depends on discovery order is therefore deterministic.

use std::collections::{HashSet, VecDeque};

use tracing::debug;
use twig_store::{Commit, ObjectStore};
use twig_types::ObjectId;

use crate::error::{DagError, DagResult};

/// Read-only view of the commit DAG held in an object store.
#[derive(Clone, Copy)]
pub struct CommitGraph<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> CommitGraph<'a> {
    /// Walk commits stored in `store`.
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    fn load(&self, id: &ObjectId) -> DagResult<Commit> {
        Ok(self.store.get_commit(id)?)
    }

    fn load_parent(&self, child: &ObjectId, parent: &ObjectId) -> DagResult<Commit> {
        self.store
            .get_commit(parent)
            .map_err(|source| DagError::BrokenEdge {
                child: *child,
                source,
            })
    }

    // ---------------------------------------------------------------
    // Ancestors
    // ---------------------------------------------------------------

    /// Every commit reachable from `start`, including `start` itself.
    pub fn ancestors(&self, start: &ObjectId) -> DagResult<HashSet<ObjectId>> {
        let first = self.load(start)?;
        let mut visited = HashSet::new();
        visited.insert(*start);
        let mut queue = VecDeque::new();
        queue.push_back(first);

        while let Some(commit) = queue.pop_front() {
            for parent in commit.parents() {
                if visited.insert(parent) {
                    queue.push_back(self.load_parent(&commit.id, &parent)?);
                }
            }
        }

        debug!(start = %start.short_hex(), count = visited.len(), "collected ancestors");
        Ok(visited)
    }

    /// Returns `true` if `ancestor` is reachable from `descendant`.
    ///
    /// A commit is its own ancestor.
    pub fn is_ancestor(&self, ancestor: &ObjectId, descendant: &ObjectId) -> DagResult<bool> {
        Ok(self.ancestors(descendant)?.contains(ancestor))
    }

    // ---------------------------------------------------------------
    // Merge base
    // ---------------------------------------------------------------

    /// The member of `other_ancestors` nearest to `from`.
    ///
    /// Breadth-first search from `from`, where `from` sits at level 0 and each
    /// parent or merge-parent edge adds one level. The answer is a hit at the
    /// smallest level. When one level holds several hits, the first one
    /// discovered wins.
    ///
    /// Returns `None` only when the two histories share no commit, which
    /// cannot happen inside one repository since every commit descends from
    /// the root.
    pub fn lowest_common_ancestor(
        &self,
        from: &ObjectId,
        other_ancestors: &HashSet<ObjectId>,
    ) -> DagResult<Option<ObjectId>> {
        if other_ancestors.contains(from) {
            return Ok(Some(*from));
        }

        let mut visited = HashSet::new();
        visited.insert(*from);
        let mut frontier = vec![self.load(from)?];
        let mut level = 0usize;

        while !frontier.is_empty() {
            level += 1;
            let mut next = Vec::new();
            for commit in &frontier {
                for parent in commit.parents() {
                    if !visited.insert(parent) {
                        continue;
                    }
                    if other_ancestors.contains(&parent) {
                        debug!(
                            from = %from.short_hex(),
                            split = %parent.short_hex(),
                            level,
                            "found split point"
                        );
                        return Ok(Some(parent));
                    }
                    next.push(self.load_parent(&commit.id, &parent)?);
                }
            }
            frontier = next;
        }

        Ok(None)
    }

    // ---------------------------------------------------------------
    // History
    // ---------------------------------------------------------------

    /// First-parent history from `start` back to the root, newest first.
    ///
    /// Merge parents are not followed.
    pub fn history(&self, start: &ObjectId) -> DagResult<Vec<Commit>> {
        let mut current = self.load(start)?;
        let mut commits = Vec::new();
        while let Some(parent) = current.parent {
            let next = self.load_parent(&current.id, &parent)?;
            commits.push(std::mem::replace(&mut current, next));
        }
        commits.push(current);
        Ok(commits)
    }
}

impl std::fmt::Debug for CommitGraph<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitGraph").finish_non_exhaustive()
    }
}
