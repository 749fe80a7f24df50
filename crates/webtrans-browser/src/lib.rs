//! Browser host: Chromium lifecycle and a CDP-backed [`Page`].
//!
//! Launches a Chromium instance with remote debugging enabled, attaches to
//! its first page target and exposes it to the translation engine.
//!
//! [`Page`]: webtrans_engine::Page

pub mod cdp;
pub mod config;
pub mod detect;
pub mod manager;
pub mod page;
pub mod types;

pub use cdp::CdpClient;
pub use config::BrowserConfig;
pub use detect::{detect_browser, DetectionResult};
pub use manager::BrowserManager;
pub use page::CdpPage;
pub use types::*;
