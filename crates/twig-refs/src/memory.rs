//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] keeps branches in a `BTreeMap` protected by a
//! `RwLock`, which makes the sorted `branches()` listing free.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;
use twig_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::traits::RefStore;

/// An in-memory implementation of [`RefStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    branches: RwLock<BTreeMap<String, ObjectId>>,
    head: RwLock<Option<String>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_branch(&self, name: &str) -> Result<Option<ObjectId>> {
        let branches = self.branches.read().unwrap_or_else(PoisonError::into_inner);
        Ok(branches.get(name).copied())
    }

    fn write_branch(&self, name: &str, target: &ObjectId) -> Result<()> {
        validate_branch_name(name)?;
        let mut branches = self.branches.write().unwrap_or_else(PoisonError::into_inner);
        branches.insert(name.to_string(), *target);
        debug!(branch = name, target = %target.short_hex(), "moved branch");
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<bool> {
        if self.head()?.as_deref() == Some(name) {
            return Err(RefError::DeleteCurrentBranch {
                name: name.to_string(),
            });
        }
        let mut branches = self.branches.write().unwrap_or_else(PoisonError::into_inner);
        Ok(branches.remove(name).is_some())
    }

    fn branches(&self) -> Result<Vec<(String, ObjectId)>> {
        let branches = self.branches.read().unwrap_or_else(PoisonError::into_inner);
        Ok(branches.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    fn head(&self) -> Result<Option<String>> {
        let head = self.head.read().unwrap_or_else(PoisonError::into_inner);
        Ok(head.clone())
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let mut head = self.head.write().unwrap_or_else(PoisonError::into_inner);
        *head = Some(branch.to_string());
        Ok(())
    }
}
