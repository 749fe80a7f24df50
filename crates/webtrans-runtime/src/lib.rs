//! Host side of web-page translation.
//!
//! Queues translation items, runs them one at a time against a shared page,
//! rotates through providers and re-issues requests across page loads.

pub mod config;
pub mod translator;
pub mod types;

pub use config::TranslationSettings;
pub use translator::WebTranslator;
pub use types::*;
