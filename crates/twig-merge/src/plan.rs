//! Three-way decision table.
//!
//! Every path present in any of the current, given or split maps is
//! classified by which maps hold it and which of those agree:
//!
//! | current | given | split | condition                        | action      |
//! |---------|-------|-------|----------------------------------|-------------|
//! | c       | g     | s     | s == c, s != g                   | take given  |
//! | c       | g     | s     | s != c, s != g, c != g           | conflict    |
//! | c       | g     | s     | otherwise                        | keep        |
//! | c       | g     | -     | c != g                           | conflict    |
//! | c       | g     | -     | c == g                           | keep        |
//! | c       | -     | s     | s == c                           | remove      |
//! | c       | -     | s     | s != c                           | conflict    |
//! | c       | -     | -     |                                  | keep        |
//! | -       | g     | s     | s != g                           | conflict    |
//! | -       | g     | s     | s == g                           | keep        |
//! | -       | g     | -     |                                  | take given  |
//! | -       | -     | s     |                                  | keep        |
//!
//! "Keep" paths produce no entry in the plan.

use std::collections::{BTreeMap, BTreeSet};

use twig_store::FileMap;
use twig_types::ObjectId;

/// What a merge does to one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeAction {
    /// Check out and stage the given side's blob.
    TakeGiven(ObjectId),
    /// Delete the working file and stage its removal.
    Remove,
    /// Both sides changed the path differently. Either side may be absent.
    Conflict {
        current: Option<ObjectId>,
        given: Option<ObjectId>,
    },
}

impl MergeAction {
    /// Returns `true` for [`MergeAction::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Per-path merge actions, ordered by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergePlan {
    actions: BTreeMap<String, MergeAction>,
}

impl MergePlan {
    /// Classify every path of the three maps.
    pub fn build(current: &FileMap, given: &FileMap, split: &FileMap) -> Self {
        let paths: BTreeSet<&String> = current.keys().chain(given.keys()).chain(split.keys()).collect();
        let actions = paths
            .into_iter()
            .filter_map(|path| {
                decide(current.get(path), given.get(path), split.get(path))
                    .map(|action| (path.clone(), action))
            })
            .collect();
        Self { actions }
    }

    /// All non-trivial actions.
    pub fn actions(&self) -> &BTreeMap<String, MergeAction> {
        &self.actions
    }

    /// The action for one path, if any.
    pub fn get(&self, path: &str) -> Option<&MergeAction> {
        self.actions.get(path)
    }

    /// Conflicted paths, sorted.
    pub fn conflicts(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .filter(|(_, action)| action.is_conflict())
            .map(|(path, _)| path.as_str())
    }

    /// Returns `true` if any path conflicts.
    pub fn has_conflicts(&self) -> bool {
        self.actions.values().any(MergeAction::is_conflict)
    }

    /// Returns `true` if the merge changes nothing.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn decide(
    current: Option<&ObjectId>,
    given: Option<&ObjectId>,
    split: Option<&ObjectId>,
) -> Option<MergeAction> {
    let conflict = || MergeAction::Conflict {
        current: current.copied(),
        given: given.copied(),
    };
    match (current, given, split) {
        (Some(c), Some(g), Some(s)) => {
            if s == c && s != g {
                Some(MergeAction::TakeGiven(*g))
            } else if s != c && s != g && c != g {
                Some(conflict())
            } else {
                None
            }
        }
        (Some(c), Some(g), None) => (c != g).then(conflict),
        (Some(c), None, Some(s)) => Some(if s == c { MergeAction::Remove } else { conflict() }),
        (Some(_), None, None) => None,
        (None, Some(g), Some(s)) => (s != g).then(conflict),
        (None, Some(g), None) => Some(MergeAction::TakeGiven(*g)),
        (None, None, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 32])
    }

    fn one(path: &str, id: Option<u8>) -> FileMap {
        id.map(|b| FileMap::from([(path.to_string(), oid(b))]))
            .unwrap_or_default()
    }

    /// Plan a single path `f` with the given (current, given, split) blobs.
    fn decide_one(c: Option<u8>, g: Option<u8>, s: Option<u8>) -> Option<MergeAction> {
        MergePlan::build(&one("f", c), &one("f", g), &one("f", s))
            .get("f")
            .copied()
    }

    fn conflict(c: Option<u8>, g: Option<u8>) -> Option<MergeAction> {
        Some(MergeAction::Conflict {
            current: c.map(oid),
            given: g.map(oid),
        })
    }

    #[test]
    fn given_changed_only_takes_given() {
        assert_eq!(decide_one(Some(1), Some(2), Some(1)), Some(MergeAction::TakeGiven(oid(2))));
    }

    #[test]
    fn current_changed_only_keeps_current() {
        assert_eq!(decide_one(Some(2), Some(1), Some(1)), None);
    }

    #[test]
    fn both_changed_the_same_way_keeps_current() {
        assert_eq!(decide_one(Some(2), Some(2), Some(1)), None);
    }

    #[test]
    fn both_changed_differently_conflicts() {
        assert_eq!(decide_one(Some(2), Some(3), Some(1)), conflict(Some(2), Some(3)));
    }

    #[test]
    fn added_on_both_sides() {
        assert_eq!(decide_one(Some(1), Some(2), None), conflict(Some(1), Some(2)));
        assert_eq!(decide_one(Some(1), Some(1), None), None);
    }

    #[test]
    fn deleted_in_given() {
        assert_eq!(decide_one(Some(1), None, Some(1)), Some(MergeAction::Remove));
        assert_eq!(decide_one(Some(2), None, Some(1)), conflict(Some(2), None));
    }

    #[test]
    fn added_in_current_only_is_kept() {
        assert_eq!(decide_one(Some(1), None, None), None);
    }

    #[test]
    fn deleted_in_current() {
        assert_eq!(decide_one(None, Some(2), Some(1)), conflict(None, Some(2)));
        assert_eq!(decide_one(None, Some(1), Some(1)), None);
    }

    #[test]
    fn added_in_given_only_is_taken() {
        assert_eq!(decide_one(None, Some(4), None), Some(MergeAction::TakeGiven(oid(4))));
    }

    #[test]
    fn deleted_on_both_sides_is_quiet() {
        assert_eq!(decide_one(None, None, Some(1)), None);
    }

    #[test]
    fn plan_over_many_paths() {
        let split = FileMap::from([("a".into(), oid(1)), ("b".into(), oid(1)), ("c".into(), oid(1))]);
        let current = FileMap::from([("a".into(), oid(1)), ("b".into(), oid(2)), ("c".into(), oid(1))]);
        let given = FileMap::from([("a".into(), oid(3)), ("b".into(), oid(4)), ("d".into(), oid(5))]);
        let plan = MergePlan::build(&current, &given, &split);

        assert_eq!(plan.get("a"), Some(&MergeAction::TakeGiven(oid(3))));
        assert!(plan.get("b").is_some_and(MergeAction::is_conflict));
        assert_eq!(plan.get("c"), Some(&MergeAction::Remove));
        assert_eq!(plan.get("d"), Some(&MergeAction::TakeGiven(oid(5))));
        assert_eq!(plan.conflicts().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(plan.actions().len(), 4);
        assert!(plan.has_conflicts());
    }

    #[test]
    fn identical_maps_plan_nothing() {
        let files = FileMap::from([("a".into(), oid(1))]);
        assert!(MergePlan::build(&files, &files, &files).is_empty());
    }

    proptest! {
        #[test]
        fn merging_own_history_never_conflicts(
            c in proptest::option::of(0u8..3),
            s in proptest::option::of(0u8..3),
        ) {
            // When the given side never moved off the split point, the
            // current side always wins without conflicts.
            prop_assert_eq!(decide_one(c, s, s), None);
        }
    }
}
