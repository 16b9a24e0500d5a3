use std::env;
use std::path::PathBuf;

use anyhow::Result;
use dotenvy::dotenv;

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub webdriver_url: String,
    pub base_url: String,
    pub session_path: PathBuf,
    pub screenshot_path: PathBuf,
    pub headless: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://localhost:4444".to_string()),
            base_url: env::var("NOTION_BASE_URL")
                .unwrap_or_else(|_| "https://www.notion.so".to_string()),
            session_path: env::var("SESSION_PATH")
                .unwrap_or_else(|_| "cookies.json".to_string())
                .into(),
            screenshot_path: env::var("SCREENSHOT_PATH")
                .unwrap_or_else(|_| "screenshot.png".to_string())
                .into(),
            headless: env::var("HEADLESS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
