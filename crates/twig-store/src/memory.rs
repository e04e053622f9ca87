use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use twig_types::ObjectId;

use crate::error::StoreResult;
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. All objects are held in memory behind a
/// `RwLock` for safe concurrent access. Objects are cloned on read/write.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(ObjectKind, ObjectId), StoredObject>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(&(kind, *id)).cloned())
    }

    fn write(&self, id: &ObjectId, object: &StoredObject) -> StoreResult<()> {
        let mut map = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        map.entry((object.kind, *id))
            .or_insert_with(|| object.clone());
        Ok(())
    }

    fn exists(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.contains_key(&(kind, *id)))
    }

    fn list(&self, kind: ObjectKind) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<ObjectId> = map
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, id)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}
