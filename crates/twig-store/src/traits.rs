use twig_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Blob, Commit, ObjectKind, StoredObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. A second write under an existing id
///   is a no-op and never overwrites.
/// - Blobs and commits live in separate namespaces, keyed by [`ObjectKind`].
/// - The store never interprets object contents. Decoding and hash
///   verification happen in the typed helpers below.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by kind and id.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn read(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object under `id`. Idempotent.
    fn write(&self, id: &ObjectId, object: &StoredObject) -> StoreResult<()>;

    /// Check whether an object exists in the store.
    fn exists(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool>;

    /// Every id of the given kind, sorted.
    fn list(&self, kind: ObjectKind) -> StoreResult<Vec<ObjectId>>;

    /// Persist a blob and return its id.
    fn put_blob(&self, blob: &Blob) -> StoreResult<ObjectId> {
        self.write(&blob.id, &blob.to_stored_object()?)?;
        Ok(blob.id)
    }

    /// Load and verify a blob.
    fn get_blob(&self, id: &ObjectId) -> StoreResult<Blob> {
        let obj = self
            .read(ObjectKind::Blob, id)?
            .ok_or(StoreError::NotFound(*id))?;
        Blob::from_stored_object(id, &obj)
    }

    /// Persist a commit and return its id.
    fn put_commit(&self, commit: &Commit) -> StoreResult<ObjectId> {
        self.write(&commit.id, &commit.to_stored_object()?)?;
        Ok(commit.id)
    }

    /// Load and verify a commit.
    fn get_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        let obj = self
            .read(ObjectKind::Commit, id)?
            .ok_or(StoreError::NotFound(*id))?;
        Commit::from_stored_object(id, &obj)
    }

    /// Every commit id ever written, sorted.
    fn commit_ids(&self) -> StoreResult<Vec<ObjectId>> {
        self.list(ObjectKind::Commit)
    }
}
