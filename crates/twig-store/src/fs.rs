//! Filesystem object store.
//!
//! Layout under the objects directory:
//!
//! ```text
//! objects/
//!   blobs/<hex>            bincode-encoded Blob
//!   commits/<hex>          bincode-encoded Commit
//!   commit-index.json      every commit id ever written
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;
use twig_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

const COMMIT_INDEX_FILE: &str = "commit-index.json";

/// Write `data` to `path` through a temp file in the same directory.
///
/// Readers see either the old file or the complete new one.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// The set of every commit id the store has written.
///
/// Persisted as JSON so it stays inspectable by hand.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIndex {
    pub version: u32,
    pub commits: BTreeSet<ObjectId>,
}

impl CommitIndex {
    pub const VERSION: u32 = 1;

    /// Load from `path`; a missing file is an empty index.
    pub fn load(path: &Path) -> StoreResult<Self> {
        match fs::read(path) {
            Ok(bytes) => {
                let index: Self = serde_json::from_slice(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                if index.version != Self::VERSION {
                    return Err(StoreError::Serialization(format!(
                        "unsupported commit index version {}",
                        index.version
                    )));
                }
                Ok(index)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self {
                version: Self::VERSION,
                commits: BTreeSet::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to `path` atomically.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(path, &json)?;
        Ok(())
    }
}

/// One file per object, partitioned by kind.
pub struct FsObjectStore {
    root: PathBuf,
    // Serializes read-modify-write of the commit index.
    index_lock: Mutex<()>,
}

impl FsObjectStore {
    /// Open (creating if needed) an object store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(Self::dir_name(ObjectKind::Blob)))?;
        fs::create_dir_all(root.join(Self::dir_name(ObjectKind::Commit)))?;
        Ok(Self {
            root,
            index_lock: Mutex::new(()),
        })
    }

    /// The directory this store lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir_name(kind: ObjectKind) -> &'static str {
        match kind {
            ObjectKind::Blob => "blobs",
            ObjectKind::Commit => "commits",
        }
    }

    fn object_path(&self, kind: ObjectKind, id: &ObjectId) -> PathBuf {
        self.root.join(Self::dir_name(kind)).join(id.to_hex())
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(COMMIT_INDEX_FILE)
    }

    /// Load the commit index from disk.
    pub fn commit_index(&self) -> StoreResult<CommitIndex> {
        CommitIndex::load(&self.index_path())
    }

    fn record_commit(&self, id: &ObjectId) -> StoreResult<()> {
        let _guard = self.index_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = self.index_path();
        let mut index = CommitIndex::load(&path)?;
        if index.commits.insert(*id) {
            index.save(&path)?;
        }
        Ok(())
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        match fs::read(self.object_path(kind, id)) {
            Ok(data) => Ok(Some(StoredObject::new(kind, data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, id: &ObjectId, object: &StoredObject) -> StoreResult<()> {
        let path = self.object_path(object.kind, id);
        if path.exists() {
            debug!(kind = %object.kind, id = %id.short_hex(), "object already present");
        } else {
            write_atomic(&path, &object.data)?;
            debug!(kind = %object.kind, id = %id.short_hex(), size = object.size, "wrote object");
        }
        if object.kind == ObjectKind::Commit {
            self.record_commit(id)?;
        }
        Ok(())
    }

    fn exists(&self, kind: ObjectKind, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(kind, id).is_file())
    }

    fn list(&self, kind: ObjectKind) -> StoreResult<Vec<ObjectId>> {
        if kind == ObjectKind::Commit {
            return Ok(self.commit_index()?.commits.into_iter().collect());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(Self::dir_name(kind)))? {
            let entry = entry?;
            // Stray temp files from an interrupted write are not objects.
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| ObjectId::from_hex(name).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for FsObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsObjectStore")
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Blob, Commit, FileMap};
    use chrono::Utc;

    fn temp_store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path().join("objects")).unwrap();
        (dir, store)
    }

    #[test]
    fn open_creates_layout() {
        let (_dir, store) = temp_store();
        assert!(store.root().join("blobs").is_dir());
        assert!(store.root().join("commits").is_dir());
    }

    #[test]
    fn blob_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let blob = Blob::new("a.txt", b"persist me".to_vec());
        {
            let store = FsObjectStore::open(dir.path()).unwrap();
            store.put_blob(&blob).unwrap();
        }
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert_eq!(store.get_blob(&blob.id).unwrap(), blob);
        assert_eq!(store.list(ObjectKind::Blob).unwrap(), vec![blob.id]);
    }

    #[test]
    fn blob_file_is_named_by_hex() {
        let (_dir, store) = temp_store();
        let blob = Blob::new("a", b"x".to_vec());
        store.put_blob(&blob).unwrap();
        assert!(store.root().join("blobs").join(blob.id.to_hex()).is_file());
    }

    #[test]
    fn commit_index_tracks_commits() {
        let (_dir, store) = temp_store();
        let root = Commit::root("initial commit", "master");
        let next = Commit::new("next", FileMap::new(), root.id, "master", Utc::now());
        store.put_commit(&root).unwrap();
        store.put_commit(&next).unwrap();
        store.put_commit(&next).unwrap();

        let index = store.commit_index().unwrap();
        assert_eq!(index.version, CommitIndex::VERSION);
        assert_eq!(index.commits.len(), 2);

        let json = fs::read_to_string(store.root().join(COMMIT_INDEX_FILE)).unwrap();
        assert!(json.contains(&root.id.to_hex()));

        let mut expected = vec![root.id, next.id];
        expected.sort();
        assert_eq!(store.commit_ids().unwrap(), expected);
    }

    #[test]
    fn existing_file_is_not_rewritten() {
        let (_dir, store) = temp_store();
        let blob = Blob::new("a", b"original".to_vec());
        store.put_blob(&blob).unwrap();
        store
            .write(&blob.id, &StoredObject::new(ObjectKind::Blob, b"junk".to_vec()))
            .unwrap();
        assert_eq!(store.get_blob(&blob.id).unwrap(), blob);
    }

    #[test]
    fn tampered_file_is_corruption() {
        let (_dir, store) = temp_store();
        let root = Commit::root("initial commit", "master");
        store.put_commit(&root).unwrap();

        let mut forged = root.clone();
        forged.message = "forged".into();
        let path = store.root().join("commits").join(root.id.to_hex());
        fs::write(&path, forged.to_stored_object().unwrap().data).unwrap();

        let err = store.get_commit(&root.id).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
        assert!(err.is_corruption());
    }

    #[test]
    fn truncated_file_is_corruption() {
        let (_dir, store) = temp_store();
        let blob = Blob::new("a", b"some content".to_vec());
        store.put_blob(&blob).unwrap();
        fs::write(store.root().join("blobs").join(blob.id.to_hex()), [1u8, 2]).unwrap();
        assert!(store.get_blob(&blob.id).unwrap_err().is_corruption());
    }

    #[test]
    fn missing_commit_is_not_found() {
        let (_dir, store) = temp_store();
        let id = ObjectId::from_hash([8; 32]);
        assert!(matches!(store.get_commit(&id), Err(StoreError::NotFound(_))));
        assert!(!store.exists(ObjectKind::Commit, &id).unwrap());
    }

    #[test]
    fn stray_files_are_not_listed() {
        let (_dir, store) = temp_store();
        fs::write(store.root().join("blobs").join(".tmpXYZ"), b"partial").unwrap();
        assert!(store.list(ObjectKind::Blob).unwrap().is_empty());
    }

    #[test]
    fn unsupported_index_version_is_rejected() {
        let (_dir, store) = temp_store();
        fs::write(
            store.root().join(COMMIT_INDEX_FILE),
            r#"{"version":99,"commits":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            store.commit_index(),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.txt");
        write_atomic(&path, b"hi").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hi");
        write_atomic(&path, b"again").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"again");
    }
}
