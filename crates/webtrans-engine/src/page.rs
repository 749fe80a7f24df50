//! The page capability: the only way adapters touch the provider's DOM.

use async_trait::async_trait;
use webtrans_core::Result;

/// A loaded browser page, owned by the browser host.
///
/// Reads are observation-only. `write_input` and `navigate` are the only
/// mutations an adapter performs.
#[async_trait]
pub trait Page: Send + Sync {
    /// Current `window.location.href`.
    async fn location(&self) -> Result<String>;

    /// `.value` of a form control, or `innerText` of any other element.
    /// `None` when nothing matches the selector.
    async fn read_value(&self, selector: &str) -> Result<Option<String>>;

    /// `innerText` of every element matching the selector, in document order.
    async fn read_texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Set the control's value and, when `notify` is set, dispatch a bubbling
    /// `input` event so the page's own UI reacts. Returns `false` when the
    /// element is absent.
    async fn write_input(&self, selector: &str, text: &str, notify: bool) -> Result<bool>;

    /// Start a full navigation. The current page context is discarded.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// `document.readyState`.
    async fn ready_state(&self) -> Result<String>;
}
