//! In-memory page for tests and offline runs.
//!
//! Holds a flat selector → content map instead of a DOM. Hooks stand in for
//! the provider's own scripts: `on_load` renders a freshly navigated page,
//! `on_input` reacts to the input control changing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use webtrans_core::{Error, Result};

use crate::location::PageLocationFacts;
use crate::page::Page;

type LoadHook = Arc<dyn Fn(&mut MockDom, &str) + Send + Sync>;
type InputHook = Arc<dyn Fn(&mut MockDom, &str, &str) + Send + Sync>;

/// Mutable content of a [`MockPage`].
#[derive(Debug, Default)]
pub struct MockDom {
    pub location: String,
    pub values: HashMap<String, String>,
    pub texts: HashMap<String, Vec<String>>,
}

impl MockDom {
    pub fn set_value(&mut self, selector: &str, value: &str) {
        self.values.insert(selector.to_string(), value.to_string());
    }

    pub fn set_texts(&mut self, selector: &str, texts: &[&str]) {
        self.texts.insert(
            selector.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
    }

    pub fn remove(&mut self, selector: &str) {
        self.values.remove(selector);
        self.texts.remove(selector);
    }
}

#[derive(Default)]
struct MockState {
    dom: MockDom,
    navigations: Vec<String>,
    input_events: usize,
    /// Polls of `ready_state` left before the current load completes.
    loading_polls: usize,
    fail_reads: bool,
    fail_navigation: bool,
}

#[derive(Clone, Default)]
pub struct MockPage {
    state: Arc<Mutex<MockState>>,
    on_load: Option<LoadHook>,
    on_input: Option<InputHook>,
}

impl MockPage {
    pub fn new(location: &str) -> Self {
        let page = Self::default();
        page.state.lock().dom.location = location.to_string();
        page
    }

    pub fn blank() -> Self {
        Self::new("about:blank")
    }

    /// Render hook run after every navigation, with the new address.
    pub fn on_load(mut self, hook: impl Fn(&mut MockDom, &str) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Arc::new(hook));
        self
    }

    /// Hook run whenever `write_input` changes a control.
    pub fn on_input(
        mut self,
        hook: impl Fn(&mut MockDom, &str, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_input = Some(Arc::new(hook));
        self
    }

    pub fn set_location(&self, location: &str) {
        self.state.lock().dom.location = location.to_string();
    }

    pub fn current_location(&self) -> String {
        self.state.lock().dom.location.clone()
    }

    pub fn add_input(&self, selector: &str) {
        self.set_value(selector, "");
    }

    pub fn set_value(&self, selector: &str, value: &str) {
        self.state.lock().dom.set_value(selector, value);
    }

    pub fn set_texts(&self, selector: &str, texts: &[&str]) {
        self.state.lock().dom.set_texts(selector, texts);
    }

    pub fn remove(&self, selector: &str) {
        self.state.lock().dom.remove(selector);
    }

    pub fn value(&self, selector: &str) -> Option<String> {
        self.state.lock().dom.values.get(selector).cloned()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    pub fn input_events(&self) -> usize {
        self.state.lock().input_events
    }

    /// Make every read fail, as a crashed or detached page would.
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn fail_navigation(&self, fail: bool) {
        self.state.lock().fail_navigation = fail;
    }

    /// Report `loading` for the next `polls` readiness checks.
    pub fn set_loading_polls(&self, polls: usize) {
        self.state.lock().loading_polls = polls;
    }

    fn check_reads(state: &MockState) -> Result<()> {
        if state.fail_reads {
            return Err(Error::Page("mock page is unavailable".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MockPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockPage")
            .field("location", &state.dom.location)
            .field("navigations", &state.navigations.len())
            .finish()
    }
}

#[async_trait]
impl Page for MockPage {
    async fn location(&self) -> Result<String> {
        let state = self.state.lock();
        Self::check_reads(&state)?;
        Ok(state.dom.location.clone())
    }

    async fn read_value(&self, selector: &str) -> Result<Option<String>> {
        let state = self.state.lock();
        Self::check_reads(&state)?;
        Ok(state.dom.values.get(selector).cloned())
    }

    async fn read_texts(&self, selector: &str) -> Result<Vec<String>> {
        let state = self.state.lock();
        Self::check_reads(&state)?;
        Ok(state.dom.texts.get(selector).cloned().unwrap_or_default())
    }

    async fn write_input(&self, selector: &str, text: &str, notify: bool) -> Result<bool> {
        let mut state = self.state.lock();
        if !state.dom.values.contains_key(selector) {
            return Ok(false);
        }
        state.dom.set_value(selector, text);
        if notify {
            state.input_events += 1;
        }
        if let Some(hook) = &self.on_input {
            hook(&mut state.dom, selector, text);
        }
        Ok(true)
    }

    /// A fragment-only change keeps the DOM, as a browser does; anything
    /// else replaces it.
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_navigation {
            return Err(Error::Navigation(format!("failed to load {}", url)));
        }
        state.navigations.push(url.to_string());
        let current = PageLocationFacts::parse(&state.dom.location);
        if current.same_document(&PageLocationFacts::parse(url)) {
            state.dom.location = url.to_string();
        } else {
            state.dom = MockDom {
                location: url.to_string(),
                ..MockDom::default()
            };
        }
        if let Some(hook) = &self.on_load {
            hook(&mut state.dom, url);
        }
        Ok(())
    }

    async fn ready_state(&self) -> Result<String> {
        let mut state = self.state.lock();
        Self::check_reads(&state)?;
        if state.loading_polls > 0 {
            state.loading_polls -= 1;
            return Ok("loading".into());
        }
        Ok("complete".into())
    }
}
