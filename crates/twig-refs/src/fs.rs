//! Filesystem reference store.
//!
//! ```text
//! <root>/HEAD                 current branch name
//! <root>/refs/heads/<name>    commit hex of each branch
//! ```
//!
//! Every write goes through a temp file in the target directory and is
//! renamed into place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use twig_types::ObjectId;
use walkdir::WalkDir;

use crate::error::{RefError, Result};
use crate::names::validate_branch_name;
use crate::traits::RefStore;

const HEAD_FILE: &str = "HEAD";
const HEADS_DIR: &str = "refs/heads";

/// A [`RefStore`] backed by plain files.
#[derive(Debug, Clone)]
pub struct FsRefStore {
    root: PathBuf,
}

impl FsRefStore {
    /// Open (creating the layout if needed) a ref store under `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(HEADS_DIR))?;
        Ok(Self { root })
    }

    fn heads_dir(&self) -> PathBuf {
        self.root.join(HEADS_DIR)
    }

    fn branch_path(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.heads_dir(), |path, part| path.join(part))
    }

    fn parse_target(name: &str, raw: &str) -> Result<ObjectId> {
        ObjectId::from_hex(raw).map_err(|e| RefError::Corrupt {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn write_file(path: &Path, contents: &str) -> io::Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Remove directories left empty by deleting a nested branch.
    fn prune_empty_dirs(&self, from: &Path) {
        let heads = self.heads_dir();
        let mut dir = from.parent();
        while let Some(d) = dir {
            if d == heads || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }
}

impl RefStore for FsRefStore {
    fn read_branch(&self, name: &str) -> Result<Option<ObjectId>> {
        if validate_branch_name(name).is_err() {
            return Ok(None);
        }
        let path = self.branch_path(name);
        if path.is_dir() {
            return Ok(None);
        }
        match fs::read_to_string(path) {
            Ok(raw) => Ok(Some(Self::parse_target(name, &raw)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_branch(&self, name: &str, target: &ObjectId) -> Result<()> {
        validate_branch_name(name)?;
        Self::write_file(&self.branch_path(name), &format!("{}\n", target.to_hex()))?;
        debug!(branch = name, target = %target.short_hex(), "moved branch");
        Ok(())
    }

    fn delete_branch(&self, name: &str) -> Result<bool> {
        if self.head()?.as_deref() == Some(name) {
            return Err(RefError::DeleteCurrentBranch {
                name: name.to_string(),
            });
        }
        if validate_branch_name(name).is_err() {
            return Ok(false);
        }
        let path = self.branch_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                self.prune_empty_dirs(&path);
                debug!(branch = name, "deleted branch");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn branches(&self) -> Result<Vec<(String, ObjectId)>> {
        let heads = self.heads_dir();
        let mut result = Vec::new();
        for entry in WalkDir::new(&heads).min_depth(1) {
            let entry = entry.map_err(|e| {
                e.into_io_error()
                    .unwrap_or_else(|| io::Error::other("walk error in refs/heads"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&heads) else {
                continue;
            };
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            // Temp files from an interrupted write are not branches.
            if validate_branch_name(&name).is_err() {
                continue;
            }
            let raw = fs::read_to_string(entry.path())?;
            result.push((name.clone(), Self::parse_target(&name, &raw)?));
        }
        result.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(result)
    }

    fn head(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.root.join(HEAD_FILE)) {
            Ok(raw) => Ok(Some(raw.trim_end().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        Self::write_file(&self.root.join(HEAD_FILE), &format!("{branch}\n"))?;
        debug!(branch, "set HEAD");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(byte: u8) -> ObjectId {
        ObjectId::from_hash([byte; 32])
    }

    fn temp_store() -> (tempfile::TempDir, FsRefStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsRefStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn branch_file_holds_hex() {
        let (dir, store) = temp_store();
        store.write_branch("master", &oid(3)).unwrap();
        let raw = fs::read_to_string(dir.path().join("refs/heads/master")).unwrap();
        assert_eq!(raw.trim(), oid(3).to_hex());
        assert_eq!(store.read_branch("master").unwrap(), Some(oid(3)));
    }

    #[test]
    fn refs_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsRefStore::open(dir.path()).unwrap();
            store.write_branch("master", &oid(1)).unwrap();
            store.set_head("master").unwrap();
        }
        let store = FsRefStore::open(dir.path()).unwrap();
        assert_eq!(store.current_branch().unwrap(), "master");
        assert_eq!(store.head_commit().unwrap(), oid(1));
    }

    #[test]
    fn nested_branches_list_with_slashes() {
        let (_dir, store) = temp_store();
        store.write_branch("master", &oid(1)).unwrap();
        store.write_branch("feature/auth", &oid(2)).unwrap();
        store.write_branch("feature/ui", &oid(3)).unwrap();
        let listed = store.branches().unwrap();
        assert_eq!(
            listed,
            vec![
                ("feature/auth".to_string(), oid(2)),
                ("feature/ui".to_string(), oid(3)),
                ("master".to_string(), oid(1)),
            ]
        );
    }

    #[test]
    fn deleting_nested_branch_prunes_directory() {
        let (dir, store) = temp_store();
        store.write_branch("master", &oid(1)).unwrap();
        store.set_head("master").unwrap();
        store.write_branch("topic/x", &oid(2)).unwrap();
        assert!(store.delete_branch("topic/x").unwrap());
        assert!(!dir.path().join("refs/heads/topic").exists());
        store.write_branch("topic", &oid(3)).unwrap();
        assert_eq!(store.read_branch("topic").unwrap(), Some(oid(3)));
    }

    #[test]
    fn nested_name_clash_is_rejected() {
        let (_dir, store) = temp_store();
        store.create_branch("feature", &oid(1)).unwrap();
        assert!(matches!(
            store.create_branch("feature/x", &oid(1)),
            Err(RefError::InvalidBranchName { .. })
        ));

        store.create_branch("topic/a", &oid(2)).unwrap();
        assert!(matches!(
            store.create_branch("topic", &oid(2)),
            Err(RefError::InvalidBranchName { .. })
        ));
        store.create_branch("topic/b", &oid(3)).unwrap();
        store.create_branch("topical", &oid(3)).unwrap();
    }

    #[test]
    fn cannot_delete_current_branch() {
        let (_dir, store) = temp_store();
        store.write_branch("master", &oid(1)).unwrap();
        store.set_head("master").unwrap();
        assert!(matches!(
            store.delete_branch("master"),
            Err(RefError::DeleteCurrentBranch { .. })
        ));
    }

    #[test]
    fn missing_branch_reads_none() {
        let (_dir, store) = temp_store();
        assert_eq!(store.read_branch("nope").unwrap(), None);
        assert_eq!(store.read_branch("../../etc").unwrap(), None);
        assert!(!store.delete_branch("nope").unwrap());
    }

    #[test]
    fn garbage_ref_is_corrupt() {
        let (dir, store) = temp_store();
        fs::write(dir.path().join("refs/heads/broken"), "not-a-hash").unwrap();
        assert!(matches!(
            store.read_branch("broken"),
            Err(RefError::Corrupt { .. })
        ));
    }

    #[test]
    fn head_unset_before_init() {
        let (_dir, store) = temp_store();
        assert_eq!(store.head().unwrap(), None);
    }
}
