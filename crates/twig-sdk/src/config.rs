use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Per-repository settings, read from `.twig/config.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Branch created by `init`.
    pub default_branch: String,
    /// Message of the root commit.
    pub initial_message: String,
    /// Hex digits shown for parents on a `Merge:` log line.
    pub abbrev: usize,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            default_branch: "master".into(),
            initial_message: "initial commit".into(),
            abbrev: 7,
        }
    }
}

impl RepoConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text).map_err(|e| SdkError::Config(e.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to `path` as TOML.
    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))?;
        twig_store::write_atomic(path, text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RepoConfig::default();
        assert_eq!(c.default_branch, "master");
        assert_eq!(c.initial_message, "initial commit");
        assert_eq!(c.abbrev, 7);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = RepoConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(c, RepoConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_branch = \"main\"\n").unwrap();
        let c = RepoConfig::load(&path).unwrap();
        assert_eq!(c.default_branch, "main");
        assert_eq!(c.abbrev, 7);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let c = RepoConfig {
            abbrev: 10,
            ..RepoConfig::default()
        };
        c.save(&path).unwrap();
        assert_eq!(RepoConfig::load(&path).unwrap(), c);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "abbrev = \"seven\"").unwrap();
        assert!(matches!(RepoConfig::load(&path), Err(SdkError::Config(_))));
    }
}
