//! Browser host types.

use serde::{Deserialize, Serialize};

/// Browser runtime status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<String>,
    pub debug_port: u16,
    pub headed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
}

/// Entry of the DevTools `/json/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.target_type == "page" && self.web_socket_debugger_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_list_parsing() {
        let body = r#"[
            {"id": "A", "type": "service_worker", "url": "chrome://x"},
            {"id": "B", "type": "page", "url": "about:blank",
             "webSocketDebuggerUrl": "ws://127.0.0.1:9333/devtools/page/B"}
        ]"#;
        let targets: Vec<TargetInfo> = serde_json::from_str(body).unwrap();
        let page = targets.iter().find(|t| t.is_page()).unwrap();
        assert_eq!(page.id, "B");
        assert!(!targets[0].is_page());
    }

    #[test]
    fn test_status_shape() {
        let status = BrowserStatus {
            running: true,
            pid: Some(42),
            launched_at: None,
            debug_port: 9333,
            headed: false,
            executable: Some("/usr/bin/chromium".into()),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["debugPort"], 9333);
        assert_eq!(json["pid"], 42);
        assert!(json.get("launchedAt").is_none());
    }
}
