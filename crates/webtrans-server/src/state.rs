//! Shared application state.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use webtrans_browser::BrowserManager;
use webtrans_core::{Error, Result, WebTransConfig};
use webtrans_engine::Page;
use webtrans_runtime::{TranslationSettings, WebTranslator};

pub struct AppState {
    pub config: WebTransConfig,
    /// `None` when translations run against a page supplied up front.
    pub browser: Option<BrowserManager>,
    settings: RwLock<TranslationSettings>,
    translator: tokio::sync::Mutex<Option<Arc<WebTranslator>>>,
}

impl AppState {
    /// State backed by a Chromium instance launched on first use.
    pub fn new(config: WebTransConfig) -> Self {
        let settings = TranslationSettings::load(&config.data_paths.translation_file);
        let browser = BrowserManager::new(
            &config.data_paths.browser_config_file,
            &config.data_paths.browser_profile,
        );
        Self {
            config,
            browser: Some(browser),
            settings: RwLock::new(settings),
            translator: tokio::sync::Mutex::new(None),
        }
    }

    /// State bound to an existing page. Must be called inside a tokio runtime.
    pub fn with_page(config: WebTransConfig, page: Arc<dyn Page>) -> Self {
        let settings = TranslationSettings::load(&config.data_paths.translation_file);
        let translator = WebTranslator::new(page, settings.clone());
        Self {
            config,
            browser: None,
            settings: RwLock::new(settings),
            translator: tokio::sync::Mutex::new(Some(Arc::new(translator))),
        }
    }

    /// The running translator, launching the browser if it is not up.
    pub async fn translator(&self) -> Result<Arc<WebTranslator>> {
        let mut slot = self.translator.lock().await;
        if let Some(translator) = slot.as_ref() {
            match &self.browser {
                Some(browser) if !browser.is_running() => {
                    info!("Browser went away, starting a new translator");
                    translator.shutdown();
                }
                _ => return Ok(translator.clone()),
            }
        }

        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| Error::Internal("no page to translate in".into()))?;
        let page = browser.launch().await?;
        let translator = Arc::new(WebTranslator::new(page, self.settings.read().clone()));
        *slot = Some(translator.clone());
        Ok(translator)
    }

    /// The translator if one is running. Never launches anything.
    pub async fn current_translator(&self) -> Option<Arc<WebTranslator>> {
        self.translator.lock().await.clone()
    }

    /// Stop the translator and the browser behind it.
    pub async fn stop(&self) {
        if let Some(translator) = self.translator.lock().await.take() {
            translator.shutdown();
        }
        if let Some(browser) = &self.browser {
            browser.close().await;
        }
    }

    pub fn settings(&self) -> TranslationSettings {
        self.settings.read().clone()
    }

    /// Validate, persist and apply translation settings. The file is
    /// written once, by the running translator when there is one.
    pub async fn update_settings(&self, mut updated: TranslationSettings) -> Result<()> {
        updated.validate()?;
        updated.config_path = self.config.data_paths.translation_file.clone();
        match self.current_translator().await {
            Some(translator) => translator.update_settings(updated.clone())?,
            None => updated.save()?,
        }
        *self.settings.write() = updated;
        Ok(())
    }
}
