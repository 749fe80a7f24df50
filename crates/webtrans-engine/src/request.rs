//! Translation request and language identifiers.

use serde::{Deserialize, Serialize};
use webtrans_core::{Error, Result};

/// Language identifier accepted by the providers, or `auto` for detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub const AUTO: &'static str = "auto";

    pub fn parse(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::InvalidLanguage("language code is empty".into()));
        }
        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidLanguage(format!(
                "invalid characters in language code: {}",
                code
            )));
        }
        Ok(Self(code.to_string()))
    }

    pub fn auto() -> Self {
        Self(Self::AUTO.into())
    }

    pub fn is_auto(&self) -> bool {
        self.0.eq_ignore_ascii_case(Self::AUTO)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Providers treat language codes case-insensitively (`zh-CN` == `zh-cn`).
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One request to translate `text`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    text: String,
    source: LanguageCode,
    target: LanguageCode,
}

impl TranslationRequest {
    pub fn new(text: &str, source: &str, target: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::InvalidRequest("text is empty".into()));
        }
        let source = if source.trim().is_empty() {
            LanguageCode::auto()
        } else {
            LanguageCode::parse(source)?
        };
        let target = LanguageCode::parse(target)?;
        if target.is_auto() {
            return Err(Error::InvalidLanguage(
                "target language cannot be auto".into(),
            ));
        }
        Ok(Self {
            text: text.to_string(),
            source,
            target,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &LanguageCode {
        &self.source
    }

    pub fn target(&self) -> &LanguageCode {
        &self.target
    }
}
