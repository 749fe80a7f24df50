//! Browser launch configuration persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persisted browser configuration (`browser.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserConfig {
    /// Explicit Chromium executable; detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
    /// Show the browser window. Useful to watch a provider page misbehave.
    #[serde(default = "default_false")]
    pub headed: bool,
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,
    #[serde(default = "default_false")]
    pub load_images: bool,
    #[serde(default = "default_false")]
    pub ignore_ssl_errors: bool,
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout_secs: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
    /// Path to config file (not serialized).
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_false() -> bool {
    false
}
fn default_debug_port() -> u16 {
    9333
}
fn default_launch_timeout() -> u64 {
    20
}
fn default_command_timeout() -> u64 {
    10
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headed: false,
            debug_port: default_debug_port(),
            load_images: false,
            ignore_ssl_errors: false,
            launch_timeout_secs: default_launch_timeout(),
            command_timeout_secs: default_command_timeout(),
            config_path: PathBuf::new(),
        }
    }
}

impl BrowserConfig {
    /// Load config from a JSON file, or return defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: BrowserConfig = match std::fs::read_to_string(config_path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", config_path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        config.config_path = config_path.to_path_buf();
        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&self.config_path, json)
    }

    /// Command-line flags for a Chromium launch using `profile_dir`.
    pub fn launch_args(&self, profile_dir: &Path) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", profile_dir.display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-background-networking".to_string(),
        ];
        if !self.headed {
            args.push("--headless=new".to_string());
        }
        if !self.load_images {
            args.push("--blink-settings=imagesEnabled=false".to_string());
        }
        if self.ignore_ssl_errors {
            args.push("--ignore-certificate-errors".to_string());
        }
        args.push("about:blank".to_string());
        args
    }
}
