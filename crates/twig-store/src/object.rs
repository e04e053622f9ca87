use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use twig_types::{ContentHasher, ObjectId};

use crate::error::{StoreError, StoreResult};

/// A commit's view of the tracked tree: path to blob id.
///
/// A `BTreeMap` so that iteration, and therefore the commit hash, follows
/// ascending path order.
pub type FileMap = BTreeMap<String, ObjectId>;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// One file's content.
    Blob,
    /// A tree snapshot with parent links.
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data + cached size.
///
/// `StoredObject` is the unit of storage. Backends never interpret the
/// contents of `data`; decoding and id verification happen in [`Blob`] and
/// [`Commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// The type of this object.
    pub kind: ObjectKind,
    /// The serialized bytes of the object.
    pub data: Vec<u8>,
    /// The size of `data` in bytes.
    pub size: u64,
}

impl StoredObject {
    /// Create a new stored object from kind and data.
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        Self { kind, data, size }
    }

    fn encode<T: Serialize>(kind: ObjectKind, value: &T) -> StoreResult<Self> {
        let data =
            bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Self::new(kind, data))
    }

    fn decode<T: for<'de> Deserialize<'de>>(&self, id: &ObjectId, expected: ObjectKind) -> StoreResult<T> {
        if self.kind != expected {
            return Err(StoreError::CorruptObject {
                id: *id,
                reason: format!("expected {expected}, got {}", self.kind),
            });
        }
        bincode::deserialize(&self.data).map_err(|e| StoreError::CorruptObject {
            id: *id,
            reason: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Immutable snapshot of one file's content at stage time.
///
/// The id covers the file name, the raw bytes, and the decoded text, so the
/// same bytes staged under two names are two distinct blobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub id: ObjectId,
    pub name: String,
    pub data: Vec<u8>,
    /// `data` decoded as UTF-8, with invalid sequences replaced.
    pub text: String,
}

impl Blob {
    /// Create a blob for `name` holding `data`.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let text = String::from_utf8_lossy(&data).into_owned();
        let id = Self::compute_id(&name, &data, &text);
        Self {
            id,
            name,
            data,
            text,
        }
    }

    /// The id a blob with these fields would have.
    pub fn compute_id(name: &str, data: &[u8], text: &str) -> ObjectId {
        ContentHasher::BLOB.hash_fields([name.as_bytes(), data, text.as_bytes()])
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode(ObjectKind::Blob, self)
    }

    /// Decode from a `StoredObject` read under `id`, verifying the hash.
    pub fn from_stored_object(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        let blob: Self = obj.decode(id, ObjectKind::Blob)?;
        let computed = Self::compute_id(&blob.name, &blob.data, &blob.text);
        if computed != *id || blob.id != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(blob)
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Immutable node of the history DAG.
///
/// `files` is the entire tracked tree at this commit, not a delta. Only the
/// root commit has no `parent`; only merge commits carry a `merge_parent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: ObjectId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Branch that was checked out when the commit was made.
    pub branch: String,
    pub files: FileMap,
    pub parent: Option<ObjectId>,
    pub merge_parent: Option<ObjectId>,
}

impl Commit {
    /// The root commit: no parent, no files, timestamp at the Unix epoch.
    pub fn root(message: impl Into<String>, branch: impl Into<String>) -> Self {
        Self::build(
            message.into(),
            DateTime::<Utc>::default(),
            branch.into(),
            FileMap::new(),
            None,
            None,
        )
    }

    /// An ordinary single-parent commit.
    pub fn new(
        message: impl Into<String>,
        files: FileMap,
        parent: ObjectId,
        branch: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::build(message.into(), timestamp, branch.into(), files, Some(parent), None)
    }

    /// A two-parent commit recording `given_branch` merged into `current_branch`.
    pub fn merge(
        files: FileMap,
        parent: ObjectId,
        merge_parent: ObjectId,
        current_branch: &str,
        given_branch: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::build(
            format!("Merged {given_branch} into {current_branch}."),
            timestamp,
            current_branch.to_string(),
            files,
            Some(parent),
            Some(merge_parent),
        )
    }

    fn build(
        message: String,
        timestamp: DateTime<Utc>,
        branch: String,
        files: FileMap,
        parent: Option<ObjectId>,
        merge_parent: Option<ObjectId>,
    ) -> Self {
        let mut commit = Self {
            id: ObjectId::from_hash([0; 32]),
            message,
            timestamp,
            branch,
            files,
            parent,
            merge_parent,
        };
        commit.id = commit.compute_id();
        commit
    }

    /// Returns `true` if this commit has a merge parent.
    pub fn is_merge(&self) -> bool {
        self.merge_parent.is_some()
    }

    /// Returns `true` if this is the root commit.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Parent edges in traversal order: first parent, then merge parent.
    pub fn parents(&self) -> impl Iterator<Item = ObjectId> {
        self.parent.into_iter().chain(self.merge_parent)
    }

    /// Recompute the id from the commit's fields.
    ///
    /// Hashes message, branch and timestamp; when a parent exists, also the
    /// parent, the merge parent, and every blob id in ascending path order.
    pub fn compute_id(&self) -> ObjectId {
        let millis = self.timestamp.timestamp_millis().to_le_bytes();
        let parent_hex = self.parent.map(|p| p.to_hex());
        let merge_hex = self.merge_parent.map(|p| p.to_hex());

        let mut fields: Vec<&[u8]> =
            vec![self.message.as_bytes(), self.branch.as_bytes(), &millis[..]];
        if let Some(parent) = &parent_hex {
            fields.push(parent.as_bytes());
            if let Some(merge_parent) = &merge_hex {
                fields.push(merge_parent.as_bytes());
            }
            fields.extend(self.files.values().map(|id| &id.as_bytes()[..]));
        }
        ContentHasher::COMMIT.hash_fields(fields)
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        StoredObject::encode(ObjectKind::Commit, self)
    }

    /// Decode from a `StoredObject` read under `id`, verifying the hash.
    pub fn from_stored_object(id: &ObjectId, obj: &StoredObject) -> StoreResult<Self> {
        let commit: Self = obj.decode(id, ObjectKind::Commit)?;
        let computed = commit.compute_id();
        if computed != *id || commit.id != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn files(entries: &[(&str, &[u8])]) -> FileMap {
        entries
            .iter()
            .map(|(path, content)| (path.to_string(), Blob::new(*path, content.to_vec()).id))
            .collect()
    }

    #[test]
    fn blob_roundtrip() {
        let blob = Blob::new("a.txt", b"hello".to_vec());
        let stored = blob.to_stored_object().unwrap();
        let decoded = Blob::from_stored_object(&blob.id, &stored).unwrap();
        assert_eq!(blob, decoded);
        assert_eq!(decoded.text, "hello");
    }

    #[test]
    fn blob_id_covers_name() {
        let a = Blob::new("a.txt", b"same".to_vec());
        let b = Blob::new("b.txt", b"same".to_vec());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn blob_text_is_lossy() {
        let blob = Blob::new("bin", vec![0x66, 0xff, 0x6f]);
        assert_eq!(blob.text, "f\u{fffd}o");
    }

    #[test]
    fn blob_kind_mismatch() {
        let blob = Blob::new("a", b"x".to_vec());
        let mut stored = blob.to_stored_object().unwrap();
        stored.kind = ObjectKind::Commit;
        let err = Blob::from_stored_object(&blob.id, &stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn blob_under_wrong_id_is_a_mismatch() {
        let blob = Blob::new("a", b"x".to_vec());
        let other = Blob::new("a", b"y".to_vec());
        let stored = blob.to_stored_object().unwrap();
        let err = Blob::from_stored_object(&other.id, &stored).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn root_commit_shape() {
        let root = Commit::root("initial commit", "master");
        assert!(root.is_root());
        assert!(!root.is_merge());
        assert!(root.files.is_empty());
        assert_eq!(root.timestamp.timestamp(), 0);
        assert_eq!(root.parents().count(), 0);
        assert_eq!(root.id, root.compute_id());
    }

    #[test]
    fn root_commit_is_deterministic() {
        assert_eq!(
            Commit::root("initial commit", "master").id,
            Commit::root("initial commit", "master").id
        );
    }

    #[test]
    fn commit_roundtrip() {
        let root = Commit::root("initial commit", "master");
        let commit = Commit::new("first", files(&[("a.txt", b"hello")]), root.id, "master", at(100));
        let stored = commit.to_stored_object().unwrap();
        let decoded = Commit::from_stored_object(&commit.id, &stored).unwrap();
        assert_eq!(commit, decoded);
    }

    #[test]
    fn commit_hash_covers_files() {
        let root = Commit::root("initial commit", "master");
        let a = Commit::new("m", files(&[("a.txt", b"1")]), root.id, "master", at(5));
        let b = Commit::new("m", files(&[("a.txt", b"2")]), root.id, "master", at(5));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn commit_hash_follows_path_order_not_insertion_order() {
        let root = Commit::root("initial commit", "master");
        let x = Blob::new("x", b"x".to_vec()).id;
        let y = Blob::new("y", b"y".to_vec()).id;

        let mut forward = FileMap::new();
        forward.insert("x".into(), x);
        forward.insert("y".into(), y);
        let mut backward = FileMap::new();
        backward.insert("y".into(), y);
        backward.insert("x".into(), x);

        let a = Commit::new("m", forward, root.id, "master", at(1));
        let b = Commit::new("m", backward, root.id, "master", at(1));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn merge_commit_message_and_parents() {
        let root = Commit::root("initial commit", "master");
        let side = Commit::new("side", FileMap::new(), root.id, "feature", at(2));
        let merge = Commit::merge(FileMap::new(), root.id, side.id, "master", "feature", at(3));
        assert_eq!(merge.message, "Merged feature into master.");
        assert!(merge.is_merge());
        assert_eq!(merge.parents().collect::<Vec<_>>(), vec![root.id, side.id]);
    }

    #[test]
    fn tampered_commit_is_a_mismatch() {
        let root = Commit::root("initial commit", "master");
        let mut commit = Commit::new("msg", FileMap::new(), root.id, "master", at(9));
        let id = commit.id;
        commit.message = "other".into();
        let stored = commit.to_stored_object().unwrap();
        let err = Commit::from_stored_object(&id, &stored).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
    }

    #[test]
    fn object_kind_display() {
        assert_eq!(format!("{}", ObjectKind::Blob), "blob");
        assert_eq!(format!("{}", ObjectKind::Commit), "commit");
    }
}
