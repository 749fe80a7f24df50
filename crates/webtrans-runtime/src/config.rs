//! Translation settings, persisted as `translation.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use webtrans_core::{Error, Result};
use webtrans_engine::{PollOptions, Provider, ProfileAdapter, SiteProfile, TranslationAdapter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSettings {
    /// Provider names in the order they are tried.
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
    /// Seconds a request may wait for its result. 0 waits forever.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_load_timeout")]
    pub load_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Start every new item at the next provider instead of the first.
    #[serde(default)]
    pub force_rotate: bool,
    /// Page loads one attempt may go through before it is abandoned.
    #[serde(default = "default_max_navigations")]
    pub max_navigations: u32,
    /// Extra providers described entirely by configuration.
    #[serde(default)]
    pub custom_profiles: Vec<SiteProfile>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_providers() -> Vec<String> {
    Provider::all().iter().map(|p| p.name().to_string()).collect()
}
fn default_timeout() -> u64 {
    15
}
fn default_load_timeout() -> u64 {
    20
}
fn default_poll_interval() -> u64 {
    300
}
fn default_max_navigations() -> u32 {
    2
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            timeout_secs: default_timeout(),
            load_timeout_secs: default_load_timeout(),
            poll_interval_ms: default_poll_interval(),
            force_rotate: false,
            max_navigations: default_max_navigations(),
            custom_profiles: Vec::new(),
            config_path: PathBuf::new(),
        }
    }
}

impl TranslationSettings {
    /// Load from disk. Missing or unreadable files give the defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut settings = match std::fs::read_to_string(config_path) {
            Ok(content) => serde_json::from_str::<Self>(&content).unwrap_or_else(|e| {
                warn!("Invalid {}: {}, using defaults", config_path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        settings.config_path = config_path.to_path_buf();
        settings
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, content)?;
        info!("Saved translation settings to {}", self.config_path.display());
        Ok(())
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            request_timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            ..PollOptions::default()
        }
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    /// Adapters for `providers`, in order. Custom profiles shadow nothing:
    /// a built-in name always refers to the built-in provider.
    pub fn adapters(&self) -> Result<Vec<Arc<dyn TranslationAdapter>>> {
        self.providers
            .iter()
            .map(|name| {
                if let Some(provider) = Provider::from_name(name) {
                    return Ok(provider.adapter());
                }
                self.custom_profiles
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .map(|p| Arc::new(ProfileAdapter::new(p.clone())) as Arc<dyn TranslationAdapter>)
                    .ok_or_else(|| Error::UnknownProvider(name.clone()))
            })
            .collect()
    }

    /// Names a client may put in `providers`.
    pub fn available_providers(&self) -> Vec<String> {
        let mut names = default_providers();
        names.extend(self.custom_profiles.iter().map(|p| p.name.clone()));
        names
    }

    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(Error::Config("at least one provider is required".into()));
        }
        self.adapters().map(|_| ())
    }
}
