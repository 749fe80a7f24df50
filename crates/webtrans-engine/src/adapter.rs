//! Adapter contract: how to submit into a provider's page and how to
//! recognise a finished result there.
//!
//! Everything provider-specific (selectors, URL grammar, placeholder values)
//! lives in a [`SiteProfile`], so markup changes are a configuration edit.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tracing::debug;
use webtrans_core::Result;

use crate::location::PageLocationFacts;
use crate::page::Page;
use crate::request::{LanguageCode, TranslationRequest};

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a URL component the way `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Where a provider renders its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputRegion {
    /// One control holding the whole result.
    Value { selector: String },
    /// Several elements, joined with single spaces in document order.
    Fragments { selector: String },
}

/// A value the output region shows while a translation is not finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Placeholder {
    Empty,
    Literal(String),
    /// The previously delivered text followed by a loading suffix.
    LastDeliveredWithSuffix(String),
    /// The submitted text followed by a loading suffix.
    SourceWithSuffix(String),
    /// The submitted text echoed back unchanged.
    SourceEcho,
}

/// What the placeholder check needs to know about the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderContext<'a> {
    pub source_text: Option<&'a str>,
    pub last_delivered: &'a str,
}

impl Placeholder {
    pub fn matches(&self, candidate: &str, ctx: &PlaceholderContext<'_>) -> bool {
        match self {
            Self::Empty => candidate.is_empty(),
            Self::Literal(value) => candidate == value,
            Self::LastDeliveredWithSuffix(suffix) => {
                candidate.strip_suffix(suffix.as_str()) == Some(ctx.last_delivered)
            }
            Self::SourceWithSuffix(suffix) => ctx
                .source_text
                .is_some_and(|src| candidate.strip_suffix(suffix.as_str()) == Some(src.trim())),
            Self::SourceEcho => ctx.source_text.is_some_and(|src| candidate == src.trim()),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Swappable per-provider page contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProfile {
    pub name: String,
    /// Substring the page host must contain on a results page.
    pub host_marker: String,
    /// Prefix the page path must have on a results page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_marker: Option<String>,
    pub url_base: String,
    /// Encode the request in `#k=v&..` instead of `?k=v&..`.
    #[serde(default)]
    pub params_in_fragment: bool,
    /// Parameters emitted ahead of the request ones.
    #[serde(default)]
    pub fixed_params: Vec<(String, String)>,
    pub source_param: String,
    pub target_param: String,
    pub text_param: String,
    pub input_selector: String,
    pub output: OutputRegion,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    #[serde(default = "default_true")]
    pub dispatch_input_event: bool,
}

impl SiteProfile {
    /// True when the page already shows this provider's results view for
    /// `target`, so the input can be updated in place.
    pub fn is_results_page(&self, facts: &PageLocationFacts, target: &LanguageCode) -> bool {
        facts.host().contains(&self.host_marker)
            && self
                .path_marker
                .as_deref()
                .map_or(true, |prefix| facts.path().starts_with(prefix))
            && facts
                .param(&self.target_param)
                .is_some_and(|value| target.matches(value))
    }

    pub fn request_url(&self, request: &TranslationRequest) -> String {
        let params = self
            .fixed_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain([
                (self.source_param.as_str(), request.source().as_str()),
                (self.target_param.as_str(), request.target().as_str()),
                (self.text_param.as_str(), request.text()),
            ])
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.params_in_fragment { '#' } else { '?' };
        format!("{}{}{}", self.url_base, separator, params)
    }
}

/// Result of [`TranslationAdapter::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The page's input was updated in place; the page is translating.
    InputUpdated,
    /// Only the fragment changed. The document, its output region and the
    /// session bound to it stay in place.
    SameDocument { url: String },
    /// A full navigation was started. The current page context, and every
    /// session bound to it, is gone.
    Navigated { url: String },
}

/// Capability set implemented once per provider.
#[async_trait]
pub trait TranslationAdapter: Send + Sync {
    fn profile(&self) -> &SiteProfile;

    fn name(&self) -> &str {
        &self.profile().name
    }

    fn is_results_page(&self, facts: &PageLocationFacts, request: &TranslationRequest) -> bool {
        self.profile().is_results_page(facts, request.target())
    }

    fn request_url(&self, request: &TranslationRequest) -> String {
        self.profile().request_url(request)
    }

    /// Put `request` into the page: in place when already on a matching
    /// results page, otherwise by navigating to the provider URL.
    async fn submit(&self, page: &dyn Page, request: &TranslationRequest) -> Result<SubmitOutcome> {
        let profile = self.profile();
        let facts = PageLocationFacts::parse(&page.location().await?);

        if self.is_results_page(&facts, request) {
            let written = page
                .write_input(
                    &profile.input_selector,
                    request.text(),
                    profile.dispatch_input_event,
                )
                .await?;
            if written {
                debug!(adapter = self.name(), "input updated in place");
                return Ok(SubmitOutcome::InputUpdated);
            }
            debug!(
                adapter = self.name(),
                selector = %profile.input_selector,
                "input control missing, navigating instead"
            );
        }

        let url = self.request_url(request);
        let same_document = facts.same_document(&PageLocationFacts::parse(&url));
        debug!(adapter = self.name(), %url, same_document, "navigating");
        page.navigate(&url).await?;
        if same_document {
            return Ok(SubmitOutcome::SameDocument { url });
        }
        Ok(SubmitOutcome::Navigated { url })
    }

    /// Normalised content of the output region, before placeholder checks.
    /// `None` when the region is absent.
    async fn read_output(&self, page: &dyn Page) -> Result<Option<String>> {
        match &self.profile().output {
            OutputRegion::Value { selector } => {
                Ok(page.read_value(selector).await?.map(|v| v.trim().to_string()))
            }
            OutputRegion::Fragments { selector } => {
                let texts = page.read_texts(selector).await?;
                if texts.is_empty() {
                    return Ok(None);
                }
                Ok(Some(join_fragments(&texts)))
            }
        }
    }

    fn is_placeholder(&self, candidate: &str, ctx: &PlaceholderContext<'_>) -> bool {
        self.profile()
            .placeholders
            .iter()
            .any(|p| p.matches(candidate, ctx))
    }

    /// A candidate result, or `None` while nothing usable is shown.
    async fn extract_result(
        &self,
        page: &dyn Page,
        ctx: &PlaceholderContext<'_>,
    ) -> Result<Option<String>> {
        let Some(candidate) = self.read_output(page).await? else {
            return Ok(None);
        };
        if self.is_placeholder(&candidate, ctx) {
            return Ok(None);
        }
        Ok(Some(candidate))
    }
}

/// Join rendered fragments with single spaces, dropping blank ones.
pub fn join_fragments(texts: &[String]) -> String {
    texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Adapter driven entirely by a user-supplied profile.
#[derive(Debug, Clone)]
pub struct ProfileAdapter {
    profile: SiteProfile,
}

impl ProfileAdapter {
    pub fn new(profile: SiteProfile) -> Self {
        Self { profile }
    }
}

impl TranslationAdapter for ProfileAdapter {
    fn profile(&self) -> &SiteProfile {
        &self.profile
    }
}
