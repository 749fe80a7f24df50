//! [`Page`] over CDP `Runtime.evaluate` and `Page.navigate`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use webtrans_core::{Error, Result};
use webtrans_engine::Page;

use crate::cdp::CdpClient;

/// The attached Chromium tab.
#[derive(Clone)]
pub struct CdpPage {
    client: Arc<CdpClient>,
}

impl CdpPage {
    pub fn new(client: Arc<CdpClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<CdpClient> {
        &self.client
    }

    /// Evaluate an expression and return its JSON value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .client
            .call(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;

        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .pointer("/exception/description")
                .or_else(|| details.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("script exception");
            return Err(Error::Page(text.to_string()));
        }
        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }
}

fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(Error::from)
}

fn read_value_js(selector: &str) -> Result<String> {
    Ok(format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return null;
            return typeof el.value === 'string' ? el.value : el.innerText;
        }})()"#,
        sel = js_string(selector)?
    ))
}

fn read_texts_js(selector: &str) -> Result<String> {
    Ok(format!(
        "Array.from(document.querySelectorAll({}), el => el.innerText)",
        js_string(selector)?
    ))
}

fn write_input_js(selector: &str, text: &str, notify: bool) -> Result<String> {
    let dispatch = if notify {
        "el.dispatchEvent(new Event('input', { bubbles: true, cancelable: true }));"
    } else {
        ""
    };
    Ok(format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.value = {text};
            {dispatch}
            return true;
        }})()"#,
        sel = js_string(selector)?,
        text = js_string(text)?,
    ))
}

#[async_trait]
impl Page for CdpPage {
    async fn location(&self) -> Result<String> {
        let value = self.evaluate("window.location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn read_value(&self, selector: &str) -> Result<Option<String>> {
        let value = self.evaluate(&read_value_js(selector)?).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn read_texts(&self, selector: &str) -> Result<Vec<String>> {
        let value = self.evaluate(&read_texts_js(selector)?).await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    async fn write_input(&self, selector: &str, text: &str, notify: bool) -> Result<bool> {
        let value = self.evaluate(&write_input_js(selector, text, notify)?).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let result = self.client.call("Page.navigate", json!({ "url": url })).await?;
        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            return Err(Error::Navigation(format!("{}: {}", url, error)));
        }
        Ok(())
    }

    async fn ready_state(&self) -> Result<String> {
        let value = self.evaluate("document.readyState").await?;
        Ok(value.as_str().unwrap_or("loading").to_string())
    }
}
