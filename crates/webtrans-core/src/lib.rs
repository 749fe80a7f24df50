//! webtrans core: error type, configuration, data directory layout.

pub mod config;
pub mod error;

pub use config::{DataPaths, WebTransConfig};
pub use error::{Error, Result};
