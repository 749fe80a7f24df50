//! Chromium executable detection.

use std::path::PathBuf;

/// Chromium-based executables that speak CDP, in preference order.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "microsoft-edge",
    "brave-browser",
];

#[cfg(target_os = "macos")]
const MACOS_APP_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

#[cfg(target_os = "windows")]
const WINDOWS_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub path: Option<PathBuf>,
    pub install_hint: String,
}

impl DetectionResult {
    fn found(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            install_hint: String::new(),
        }
    }
}

/// Find a browser: configured path, then `CHROME`, then platform install
/// locations, then well-known names on `PATH`.
pub fn detect_browser(custom_path: Option<&str>) -> DetectionResult {
    let candidates = custom_path
        .map(str::to_string)
        .into_iter()
        .chain(std::env::var("CHROME").ok());
    for candidate in candidates {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return DetectionResult::found(p);
        }
    }

    #[cfg(target_os = "macos")]
    for path in MACOS_APP_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return DetectionResult::found(p);
        }
    }

    #[cfg(target_os = "windows")]
    for path in WINDOWS_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return DetectionResult::found(p);
        }
    }

    for name in CHROMIUM_EXECUTABLES {
        if let Ok(path) = which::which(name) {
            return DetectionResult::found(path);
        }
    }

    DetectionResult {
        path: None,
        install_hint: install_instructions().to_string(),
    }
}

pub fn install_instructions() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install a Chromium-based browser:\n  brew install --cask google-chrome"
    } else if cfg!(target_os = "windows") {
        "Install Google Chrome from https://www.google.com/chrome/"
    } else {
        "Install a Chromium-based browser:\n  Debian/Ubuntu: sudo apt install chromium\n  Fedora:        sudo dnf install chromium"
    }
}
