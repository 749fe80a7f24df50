//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 3010;

/// Paths to all webtrans data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Chromium user profile (`data/browser-profile/`).
    pub browser_profile: PathBuf,
    /// Browser launch configuration (`data/browser.json`).
    pub browser_config_file: PathBuf,
    /// Translation settings (`data/translation.json`).
    pub translation_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            browser_profile: root.join("browser-profile"),
            browser_config_file: root.join("browser.json"),
            translation_file: root.join("translation.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(&self.browser_profile)?;
        Ok(())
    }
}

/// Top-level webtrans configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebTransConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl WebTransConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("WEBTRANS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self { port, data_paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path()).unwrap();
        assert!(paths.browser_profile.is_dir());
        assert_eq!(paths.translation_file, dir.path().join("translation.json"));
        assert_eq!(paths.browser_config_file, dir.path().join("browser.json"));
    }

    #[test]
    fn test_data_paths_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a").join("b");
        let paths = DataPaths::new(&root).unwrap();
        assert!(paths.root.is_dir());
    }
}
