//! Settings routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;
use webtrans_browser::BrowserConfig;
use webtrans_runtime::TranslationSettings;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(get_config).put(update_config))
}

#[derive(Debug, Deserialize)]
struct ConfigBody {
    translation: Option<TranslationSettings>,
    browser: Option<BrowserConfig>,
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "translation": state.settings(),
        "browser": state.browser.as_ref().map(|b| b.get_config()),
    }))
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfigBody>,
) -> Json<serde_json::Value> {
    if let Some(settings) = body.translation {
        if let Err(e) = state.update_settings(settings).await {
            return Json(serde_json::json!({ "error": e.to_string() }));
        }
        info!("Translation settings updated");
    }
    if let Some(config) = body.browser {
        let Some(browser) = &state.browser else {
            return Json(serde_json::json!({ "error": "No browser is managed by this server" }));
        };
        if let Err(e) = browser.set_config(config) {
            return Json(serde_json::json!({ "error": e.to_string() }));
        }
        info!("Browser config updated, applies on next launch");
    }
    get_config(State(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use webtrans_core::WebTransConfig;
    use webtrans_engine::MockPage;

    async fn put(state: Arc<AppState>, body: serde_json::Value) -> serde_json::Value {
        let request = Request::put("/api/config")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_update_translation_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = WebTransConfig::from_env(dir.path()).unwrap();
        let file = config.data_paths.translation_file.clone();
        let state = Arc::new(AppState::with_page(config, Arc::new(MockPage::blank())));

        let json = put(
            state.clone(),
            serde_json::json!({ "translation": { "providers": ["bing"], "timeoutSecs": 30 } }),
        )
        .await;
        assert_eq!(json["translation"]["providers"], serde_json::json!(["bing"]));
        assert_eq!(json["translation"]["timeoutSecs"], 30);
        assert_eq!(TranslationSettings::load(&file).timeout_secs, 30);

        let translator = state.current_translator().await.unwrap();
        assert_eq!(translator.settings().providers, vec!["bing"]);
    }

    #[tokio::test]
    async fn test_settings_saved_before_browser_launch() {
        let dir = tempfile::tempdir().unwrap();
        let config = WebTransConfig::from_env(dir.path()).unwrap();
        let file = config.data_paths.translation_file.clone();
        let state = Arc::new(AppState::new(config));

        let json = put(
            state.clone(),
            serde_json::json!({ "translation": { "providers": ["google"], "pollIntervalMs": 500 } }),
        )
        .await;
        assert!(json.get("error").is_none());
        assert!(state.current_translator().await.is_none());
        assert_eq!(state.settings().poll_interval_ms, 500);
        let saved = TranslationSettings::load(&file);
        assert_eq!(saved.providers, vec!["google"]);
        assert_eq!(saved.poll_interval_ms, 500);
    }

    #[tokio::test]
    async fn test_unwritable_settings_leave_state_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = WebTransConfig::from_env(dir.path()).unwrap();
        // A directory in place of the file makes every write fail.
        std::fs::create_dir_all(&config.data_paths.translation_file).unwrap();
        let state = Arc::new(AppState::with_page(config, Arc::new(MockPage::blank())));

        let json = put(
            state.clone(),
            serde_json::json!({ "translation": { "providers": ["bing"] } }),
        )
        .await;
        assert!(json["error"].is_string());
        assert_eq!(state.settings().providers, vec!["google", "bing"]);
        let translator = state.current_translator().await.unwrap();
        assert_eq!(translator.settings().providers, vec!["google", "bing"]);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = WebTransConfig::from_env(dir.path()).unwrap();
        let state = Arc::new(AppState::with_page(config, Arc::new(MockPage::blank())));

        let json = put(
            state.clone(),
            serde_json::json!({ "translation": { "providers": ["babelfish"] } }),
        )
        .await;
        assert!(json["error"].as_str().unwrap().contains("babelfish"));
        assert_eq!(state.settings().providers, vec!["google", "bing"]);
    }

    #[tokio::test]
    async fn test_browser_config_without_browser() {
        let dir = tempfile::tempdir().unwrap();
        let config = WebTransConfig::from_env(dir.path()).unwrap();
        let state = Arc::new(AppState::with_page(config, Arc::new(MockPage::blank())));

        let json = put(state, serde_json::json!({ "browser": { "headed": true } })).await;
        assert!(json["error"].is_string());
    }
}
