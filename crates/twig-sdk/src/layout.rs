use std::path::{Path, PathBuf};

/// Name of the metadata directory at the working tree root.
pub const DOT_DIR: &str = ".twig";

/// Where each piece of repository state lives on disk.
///
/// ```text
/// <root>/.twig/config.toml
/// <root>/.twig/HEAD
/// <root>/.twig/index
/// <root>/.twig/objects/
/// <root>/.twig/refs/heads/
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dot_dir(&self) -> PathBuf {
        self.root.join(DOT_DIR)
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.dot_dir().join("objects")
    }

    pub fn index_file(&self) -> PathBuf {
        self.dot_dir().join("index")
    }

    pub fn config_file(&self) -> PathBuf {
        self.dot_dir().join("config.toml")
    }

    /// Returns `true` if `.twig` exists under the root.
    pub fn is_initialized(&self) -> bool {
        self.dot_dir().is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_dot_dir() {
        let layout = Layout::new("/work");
        assert_eq!(layout.dot_dir(), PathBuf::from("/work/.twig"));
        assert_eq!(layout.objects_dir(), PathBuf::from("/work/.twig/objects"));
        assert_eq!(layout.index_file(), PathBuf::from("/work/.twig/index"));
        assert_eq!(layout.config_file(), PathBuf::from("/work/.twig/config.toml"));
    }
}
