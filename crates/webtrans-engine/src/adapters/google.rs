//! Google Translate (`https://translate.google.com/`).
//!
//! Page contract:
//! - results page: host contains `translate.google`, parameter `tl` equals
//!   the target language
//! - URL: `https://translate.google.com/#view=home&op=translate&sl={source}&tl={target}&text={text}`
//!   (request parameters live in the fragment)
//! - input: `textarea#source`; the page watches the control itself, no
//!   event is dispatched
//! - output: fragments `span.translation > span, #result_box > span`
//!   joined with single spaces

use crate::adapter::{OutputRegion, Placeholder, SiteProfile, TranslationAdapter};

pub const NAME: &str = "google";

pub fn profile() -> SiteProfile {
    SiteProfile {
        name: NAME.into(),
        host_marker: "translate.google".into(),
        path_marker: None,
        url_base: "https://translate.google.com/".into(),
        params_in_fragment: true,
        fixed_params: vec![
            ("view".into(), "home".into()),
            ("op".into(), "translate".into()),
        ],
        source_param: "sl".into(),
        target_param: "tl".into(),
        text_param: "text".into(),
        input_selector: "textarea#source".into(),
        output: OutputRegion::Fragments {
            selector: "span.translation > span, #result_box > span".into(),
        },
        placeholders: vec![Placeholder::Empty],
        dispatch_input_event: false,
    }
}

#[derive(Debug, Clone)]
pub struct GoogleAdapter {
    profile: SiteProfile,
}

impl GoogleAdapter {
    pub fn new() -> Self {
        Self { profile: profile() }
    }

    pub fn with_profile(profile: SiteProfile) -> Self {
        Self { profile }
    }
}

impl Default for GoogleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationAdapter for GoogleAdapter {
    fn profile(&self) -> &SiteProfile {
        &self.profile
    }
}
