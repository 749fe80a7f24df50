//! Runtime types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One queued translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationItem {
    pub id: Uuid,
    pub text: String,
    pub source: String,
    pub target: String,
    pub queued_at: String,
}

impl TranslationItem {
    pub fn new(text: &str, source: &str, target: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            queued_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A completed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOutcome {
    pub item: TranslationItem,
    pub translated: String,
    pub provider: String,
}

/// Broadcast to [`WebTranslator`](crate::WebTranslator) subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TranslatorEvent {
    Translated(TranslationOutcome),
    Failed { item: TranslationItem, error: String },
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorStats {
    pub completed: u64,
    pub failed: u64,
    /// Attempts that moved on to another provider.
    pub rotations: u64,
    pub navigations: u64,
}

/// Snapshot returned by [`WebTranslator::status`](crate::WebTranslator::status).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatorStatus {
    pub queued: usize,
    pub in_flight: Option<TranslationItem>,
    pub current_provider: Option<String>,
    pub providers: Vec<String>,
    pub stats: TranslatorStats,
}
