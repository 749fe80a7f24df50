//! Translation routes: submit, status, providers.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use webtrans_browser::BrowserStatus;
use webtrans_runtime::TranslatorStatus;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/translate", post(translate))
        .route("/status", get(get_status))
        .route("/providers", get(get_providers))
        .route("/browser/launch", post(launch_browser))
        .route("/browser/close", post(close_browser))
}

#[derive(Debug, Deserialize)]
struct TranslateBody {
    text: String,
    #[serde(default)]
    source: Option<String>,
    target: String,
}

#[derive(Serialize)]
struct TranslateResponse {
    id: String,
    translated: String,
    provider: String,
}

#[derive(Serialize)]
struct StatusResponse {
    translator: Option<TranslatorStatus>,
    browser: Option<BrowserStatus>,
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TranslateBody>,
) -> Json<serde_json::Value> {
    let translator = match state.translator().await {
        Ok(translator) => translator,
        Err(e) => {
            warn!("Translator unavailable: {}", e);
            return Json(serde_json::json!({ "error": e.to_string() }));
        }
    };

    let source = body.source.as_deref().unwrap_or("auto");
    match translator.translate(&body.text, source, &body.target).await {
        Ok(outcome) => {
            info!("Translated item {} via {}", outcome.item.id, outcome.provider);
            Json(serde_json::json!(TranslateResponse {
                id: outcome.item.id.to_string(),
                translated: outcome.translated,
                provider: outcome.provider,
            }))
        }
        Err(e) => Json(serde_json::json!({ "error": e.to_string() })),
    }
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let translator = state.current_translator().await.map(|t| t.status());
    let browser = state.browser.as_ref().map(|b| b.get_status());
    Json(StatusResponse { translator, browser })
}

async fn get_providers(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let settings = state.settings();
    Json(serde_json::json!({
        "available": settings.available_providers(),
        "enabled": settings.providers,
    }))
}

async fn launch_browser(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.translator().await {
        Ok(_) => Json(serde_json::json!({ "success": true })),
        Err(e) => Json(serde_json::json!({ "error": e.to_string() })),
    }
}

async fn close_browser(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.stop().await;
    Json(serde_json::json!({ "success": true }))
}
