//! Read-only facts about the page's current address.

use url::{form_urlencoded, Url};

/// Parsed view of `window.location` used to decide whether the page is
/// already a results page for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocationFacts {
    href: String,
    host: String,
    path: String,
    query: Vec<(String, String)>,
    fragment: Vec<(String, String)>,
}

impl PageLocationFacts {
    /// Parse an address. Anything that is not an absolute URL yields blank
    /// facts: no host and no parameters.
    pub fn parse(href: &str) -> Self {
        let href = href.trim();
        let Ok(url) = Url::parse(href) else {
            return Self {
                href: href.to_string(),
                ..Self::default()
            };
        };

        let fragment = url
            .fragment()
            .map(|f| form_urlencoded::parse(f.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            href: href.to_string(),
            host: url.host_str().unwrap_or_default().to_lowercase(),
            path: url.path().to_string(),
            query: url.query_pairs().into_owned().collect(),
            fragment,
        }
    }

    pub fn blank() -> Self {
        Self::parse("about:blank")
    }

    /// No host: `about:blank`, an empty or unparseable address. Such pages
    /// never hold a result.
    pub fn is_blank(&self) -> bool {
        self.host.is_empty()
    }

    /// The address without its fragment.
    pub fn document(&self) -> &str {
        self.href
            .split_once('#')
            .map_or(self.href.as_str(), |(document, _)| document)
    }

    /// True when moving to `other` only changes the fragment, so the browser
    /// keeps the current document instead of loading a new one.
    pub fn same_document(&self, other: &PageLocationFacts) -> bool {
        !self.is_blank() && self.document() == other.document()
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Look a parameter up in the query string, then in the fragment.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .chain(self.fragment.iter())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
