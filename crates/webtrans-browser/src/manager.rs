//! Browser manager: Chromium lifecycle and the attached page.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::json;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use webtrans_core::{Error, Result};

use crate::cdp::CdpClient;
use crate::config::BrowserConfig;
use crate::detect::detect_browser;
use crate::page::CdpPage;
use crate::types::{BrowserStatus, TargetInfo};

/// Owns the Chromium process and the single page translations run in.
pub struct BrowserManager {
    config: RwLock<BrowserConfig>,
    profile_dir: PathBuf,
    child: tokio::sync::Mutex<Option<Child>>,
    page: RwLock<Option<Arc<CdpPage>>>,
    pid: RwLock<Option<u32>>,
    executable: RwLock<Option<PathBuf>>,
    launched_at: RwLock<Option<String>>,
    http: reqwest::Client,
}

impl BrowserManager {
    pub fn new(config_path: &Path, profile_dir: &Path) -> Self {
        let config = BrowserConfig::load(config_path);
        info!(
            "BrowserManager initialized: port={}, headed={}",
            config.debug_port, config.headed
        );
        Self {
            config: RwLock::new(config),
            profile_dir: profile_dir.to_path_buf(),
            child: tokio::sync::Mutex::new(None),
            page: RwLock::new(None),
            pid: RwLock::new(None),
            executable: RwLock::new(None),
            launched_at: RwLock::new(None),
            http: reqwest::Client::new(),
        }
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Start Chromium (if needed) and return the attached page.
    pub async fn launch(&self) -> Result<Arc<CdpPage>> {
        let mut child_slot = self.child.lock().await;
        if let Some(page) = self.page.read().clone() {
            if page.client().is_connected() {
                return Ok(page);
            }
            warn!("CDP connection lost, relaunching browser");
        }
        if let Some(mut old) = child_slot.take() {
            let _ = old.kill().await;
        }

        let config = self.config.read().clone();
        let detection = detect_browser(config.chrome_path.as_deref());
        let executable = detection.path.ok_or_else(|| {
            Error::Browser(format!(
                "Chrome/Chromium not found.\n{}",
                detection.install_hint
            ))
        })?;

        std::fs::create_dir_all(&self.profile_dir)?;
        let child = Command::new(&executable)
            .args(config.launch_args(&self.profile_dir))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Browser(format!("failed to start {}: {}", executable.display(), e)))?;
        let pid = child.id();
        *child_slot = Some(child);
        info!("Launched {} (pid {:?})", executable.display(), pid);

        let ws_url = self
            .wait_for_page_target(config.debug_port, Duration::from_secs(config.launch_timeout_secs))
            .await?;
        let client = CdpClient::connect(&ws_url, Duration::from_secs(config.command_timeout_secs)).await?;
        client.call("Page.enable", json!({})).await?;
        client.call("Runtime.enable", json!({})).await?;

        let page = Arc::new(CdpPage::new(Arc::new(client)));
        *self.page.write() = Some(page.clone());
        *self.pid.write() = pid;
        *self.executable.write() = Some(executable);
        *self.launched_at.write() = Some(chrono::Utc::now().to_rfc3339());
        Ok(page)
    }

    /// Stop Chromium. A no-op when it is not running.
    pub async fn close(&self) {
        self.page.write().take();
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop browser: {}", e);
            }
            info!("Browser stopped");
        }
        self.pid.write().take();
        self.launched_at.write().take();
    }

    pub fn is_running(&self) -> bool {
        self.page
            .read()
            .as_ref()
            .is_some_and(|page| page.client().is_connected())
    }

    pub fn page(&self) -> Option<Arc<CdpPage>> {
        self.page.read().clone()
    }

    pub fn get_status(&self) -> BrowserStatus {
        let config = self.config.read();
        BrowserStatus {
            running: self.is_running(),
            pid: *self.pid.read(),
            launched_at: self.launched_at.read().clone(),
            debug_port: config.debug_port,
            headed: config.headed,
            executable: self
                .executable
                .read()
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }

    // ---------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------

    pub fn get_config(&self) -> BrowserConfig {
        self.config.read().clone()
    }

    /// Replace the configuration. Takes effect on the next launch.
    pub fn set_config(&self, mut updated: BrowserConfig) -> Result<()> {
        let mut config = self.config.write();
        updated.config_path = config.config_path.clone();
        updated.save()?;
        *config = updated;
        Ok(())
    }

    // ---------------------------------------------------------------
    // DevTools discovery
    // ---------------------------------------------------------------

    async fn wait_for_page_target(&self, port: u16, timeout: Duration) -> Result<String> {
        let url = format!("http://127.0.0.1:{}/json/list", port);
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match self.fetch_targets(&url).await {
                Ok(targets) => {
                    if let Some(ws) = targets
                        .into_iter()
                        .find(TargetInfo::is_page)
                        .and_then(|t| t.web_socket_debugger_url)
                    {
                        return Ok(ws);
                    }
                    debug!("DevTools is up but has no page target yet");
                }
                Err(e) => debug!("DevTools not ready: {}", e),
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "no DevTools page target on port {} after {:?}",
                    port, timeout
                )));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    async fn fetch_targets(&self, url: &str) -> Result<Vec<TargetInfo>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        response
            .json::<Vec<TargetInfo>>()
            .await
            .map_err(|e| Error::Http(e.to_string()))
    }
}
