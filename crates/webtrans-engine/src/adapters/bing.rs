//! Bing Translator (`https://www.bing.com/translator/`).
//!
//! Page contract:
//! - results page: host contains `bing.com`, path starts with `/translator`,
//!   query parameter `to` equals the target language
//! - URL: `https://www.bing.com/translator/?from={source}&to={target}&text={text}`
//! - input: `textarea#tta_input_ta` (updated, then an `input` event fired)
//! - output: value of `#tta_output_ta`
//! - while translating the output shows `...`, or the previous result with
//!   ` ...` appended

use crate::adapter::{OutputRegion, Placeholder, SiteProfile, TranslationAdapter};

pub const NAME: &str = "bing";

pub fn profile() -> SiteProfile {
    SiteProfile {
        name: NAME.into(),
        host_marker: "bing.com".into(),
        path_marker: Some("/translator".into()),
        url_base: "https://www.bing.com/translator/".into(),
        params_in_fragment: false,
        fixed_params: Vec::new(),
        source_param: "from".into(),
        target_param: "to".into(),
        text_param: "text".into(),
        input_selector: "textarea#tta_input_ta".into(),
        output: OutputRegion::Value {
            selector: "#tta_output_ta".into(),
        },
        placeholders: vec![
            Placeholder::Empty,
            Placeholder::Literal("...".into()),
            Placeholder::LastDeliveredWithSuffix(" ...".into()),
            Placeholder::SourceWithSuffix(" ...".into()),
        ],
        dispatch_input_event: true,
    }
}

#[derive(Debug, Clone)]
pub struct BingAdapter {
    profile: SiteProfile,
}

impl BingAdapter {
    pub fn new() -> Self {
        Self { profile: profile() }
    }

    /// Built-in contract with selectors replaced, for when Bing changes its markup.
    pub fn with_profile(profile: SiteProfile) -> Self {
        Self { profile }
    }
}

impl Default for BingAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationAdapter for BingAdapter {
    fn profile(&self) -> &SiteProfile {
        &self.profile
    }
}
