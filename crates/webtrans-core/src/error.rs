//! Error types for webtrans.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Page error: {0}")]
    Page(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Failures of the third-party page or browser that a different
    /// provider might not hit.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Page(_) | Self::Browser(_) | Self::Navigation(_) | Self::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::Timeout("no result from bing".into());
        assert_eq!(err.to_string(), "Timeout: no result from bing");
    }

    #[test]
    fn test_transient() {
        assert!(Error::Page("gone".into()).is_transient());
        assert!(Error::Navigation("load failed".into()).is_transient());
        assert!(!Error::InvalidRequest("empty".into()).is_transient());
        assert!(!Error::Config("bad".into()).is_transient());
    }

    #[test]
    fn test_from_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
