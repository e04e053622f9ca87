//! Merge classification.
//!
//! [`analyze`] decides which of three shapes a merge takes:
//!
//! 1. The given head is already in the current history: nothing to do.
//! 2. The current head is in the given history: fast-forward.
//! 3. Otherwise a three-way merge against the split point.

use tracing::debug;
use twig_dag::CommitGraph;
use twig_store::{Commit, ObjectStore};
use twig_types::ObjectId;

use crate::error::{MergeError, MergeResult};
use crate::plan::MergePlan;

/// The shape of a merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergeAnalysis {
    /// The given head is an ancestor of the current head.
    UpToDate,
    /// The current head is an ancestor of the given head.
    FastForward { target: ObjectId },
    /// Histories diverged; `plan` says what to do to each path.
    ThreeWay {
        split: ObjectId,
        given: Box<Commit>,
        plan: MergePlan,
    },
}

/// Classify merging `given` into `current`.
pub fn analyze(store: &dyn ObjectStore, current: &ObjectId, given: &ObjectId) -> MergeResult<MergeAnalysis> {
    let graph = CommitGraph::new(store);

    let current_history = graph.ancestors(current)?;
    if current_history.contains(given) {
        debug!(current = %current.short_hex(), given = %given.short_hex(), "given head already merged");
        return Ok(MergeAnalysis::UpToDate);
    }

    let given_history = graph.ancestors(given)?;
    if given_history.contains(current) {
        debug!(current = %current.short_hex(), given = %given.short_hex(), "fast-forward");
        return Ok(MergeAnalysis::FastForward { target: *given });
    }

    let split = graph
        .lowest_common_ancestor(current, &given_history)?
        .ok_or(MergeError::NoSplitPoint {
            current: *current,
            given: *given,
        })?;

    let current_commit = store.get_commit(current)?;
    let given_commit = store.get_commit(given)?;
    let split_commit = store.get_commit(&split)?;
    let plan = MergePlan::build(&current_commit.files, &given_commit.files, &split_commit.files);

    debug!(
        split = %split.short_hex(),
        actions = plan.actions().len(),
        conflicts = plan.conflicts().count(),
        "three-way merge planned"
    );
    Ok(MergeAnalysis::ThreeWay {
        split,
        given: Box::new(given_commit),
        plan,
    })
}
