//! Built-in provider adapters.

pub mod bing;
pub mod google;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::{SiteProfile, TranslationAdapter};
pub use bing::BingAdapter;
pub use google::GoogleAdapter;

/// Translation providers with a built-in adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Bing,
    Google,
}

impl Provider {
    pub fn all() -> &'static [Provider] {
        &[Self::Google, Self::Bing]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Bing => bing::NAME,
            Self::Google => google::NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "bing" => Some(Self::Bing),
            "google" => Some(Self::Google),
            _ => None,
        }
    }

    pub fn profile(&self) -> SiteProfile {
        match self {
            Self::Bing => bing::profile(),
            Self::Google => google::profile(),
        }
    }

    pub fn adapter(&self) -> Arc<dyn TranslationAdapter> {
        match self {
            Self::Bing => Arc::new(BingAdapter::new()),
            Self::Google => Arc::new(GoogleAdapter::new()),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
