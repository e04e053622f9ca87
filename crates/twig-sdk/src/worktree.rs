//! The working tree: every regular file under the root except `.twig/`.
//!
//! Paths are relative to the root and `/`-separated on every platform.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use twig_store::Blob;
use twig_types::ObjectId;
use walkdir::WalkDir;

use crate::error::{SdkError, SdkResult};
use crate::layout::DOT_DIR;

#[derive(Clone, Debug)]
pub struct Worktree {
    root: PathBuf,
}

impl Worktree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn abs(&self, path: &str) -> PathBuf {
        path.split('/').fold(self.root.clone(), |p, part| p.join(part))
    }

    /// Every file path, sorted.
    pub fn list(&self) -> SdkResult<Vec<String>> {
        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.depth() == 1 && e.file_name() == DOT_DIR));
        for entry in walker {
            let entry = entry.map_err(|e| {
                SdkError::Io(
                    e.into_io_error()
                        .unwrap_or_else(|| io::Error::other("working tree walk failed")),
                )
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = relative_path(&self.root, entry.path()) {
                paths.push(rel);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Every file mapped to the id its content would have as a blob.
    pub fn snapshot(&self) -> SdkResult<BTreeMap<String, ObjectId>> {
        self.list()?
            .into_iter()
            .map(|path| {
                let data = fs::read(self.abs(&path))?;
                let id = Blob::new(path.as_str(), data).id;
                Ok::<_, SdkError>((path, id))
            })
            .collect()
    }

    /// Read a file; `None` if it does not exist.
    pub fn read(&self, path: &str) -> SdkResult<Option<Vec<u8>>> {
        match fs::read(self.abs(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create or overwrite a file, creating parent directories.
    pub fn write(&self, path: &str, data: &[u8]) -> SdkResult<()> {
        let abs = self.abs(path);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&abs, data)?;
        debug!(path, bytes = data.len(), "wrote working file");
        Ok(())
    }

    /// Delete a file if present, then any directories it leaves empty.
    pub fn remove(&self, path: &str) -> SdkResult<()> {
        let abs = self.abs(path);
        match fs::remove_file(&abs) {
            Ok(()) => debug!(path, "deleted working file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let mut dir = abs.parent();
        while let Some(d) = dir {
            if d == self.root || fs::remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
        Ok(())
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();
    Some(parts?.join("/"))
}

/// Normalize a user-supplied path to the worktree's `/`-separated form.
///
/// Strips `./` segments and a trailing `/`. Absolute paths, `..` and paths
/// into `.twig` are rejected.
pub fn normalize_path(input: &str) -> SdkResult<String> {
    let unified = input.replace('\\', "/");
    if unified.starts_with('/') {
        return Err(SdkError::InvalidPath(input.to_string()));
    }
    let parts: Vec<&str> = unified
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    if parts.is_empty() || parts.contains(&"..") || parts[0] == DOT_DIR {
        return Err(SdkError::InvalidPath(input.to_string()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_tree() -> (tempfile::TempDir, Worktree) {
        let dir = tempfile::tempdir().unwrap();
        let tree = Worktree::new(dir.path());
        (dir, tree)
    }

    #[test]
    fn list_is_recursive_and_skips_dot_dir() {
        let (dir, tree) = temp_tree();
        fs::create_dir_all(dir.path().join(".twig/objects")).unwrap();
        fs::write(dir.path().join(".twig/index"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("src/nested/c.rs"), b"c").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        assert_eq!(tree.list().unwrap(), vec!["a.txt", "b.txt", "src/nested/c.rs"]);
    }

    #[test]
    fn nested_dot_twig_is_an_ordinary_directory() {
        let (dir, tree) = temp_tree();
        fs::create_dir_all(dir.path().join("sub/.twig")).unwrap();
        fs::write(dir.path().join("sub/.twig/f"), b"f").unwrap();
        assert_eq!(tree.list().unwrap(), vec!["sub/.twig/f"]);
    }

    #[test]
    fn write_creates_parents_and_remove_prunes_them() {
        let (dir, tree) = temp_tree();
        tree.write("deep/er/file.txt", b"hi").unwrap();
        assert_eq!(tree.read("deep/er/file.txt").unwrap(), Some(b"hi".to_vec()));
        tree.remove("deep/er/file.txt").unwrap();
        assert!(!dir.path().join("deep").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn remove_missing_is_ok() {
        let (_dir, tree) = temp_tree();
        tree.remove("nothing.txt").unwrap();
        assert_eq!(tree.read("nothing.txt").unwrap(), None);
    }

    #[test]
    fn snapshot_uses_blob_ids() {
        let (_dir, tree) = temp_tree();
        tree.write("a.txt", b"hello").unwrap();
        let snap = tree.snapshot().unwrap();
        assert_eq!(snap.get("a.txt"), Some(&Blob::new("a.txt", b"hello".to_vec()).id));
    }

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize_path("a.txt").unwrap(), "a.txt");
        assert_eq!(normalize_path("./dir//b.txt").unwrap(), "dir/b.txt");
        assert_eq!(normalize_path("dir\\c.txt").unwrap(), "dir/c.txt");
        for bad in ["", "/etc/passwd", "../up", "a/../b", ".twig/index", "."] {
            assert!(normalize_path(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
