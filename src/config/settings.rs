use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const API_URL_ENV: &str = "INBOX_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8787/callback";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_ANALYTICS_DAYS: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub debounce_ms: Option<u64>,
    #[serde(default)]
    pub analytics_days: Option<u32>,
}

impl Settings {
    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    pub fn redirect_uri(&self) -> String {
        self.redirect_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string())
    }

    pub fn page_size(&self) -> AppResult<u32> {
        match self.page_size.unwrap_or(DEFAULT_PAGE_SIZE) {
            0 => Err(AppError::Config(
                "page_size in profile settings must be greater than 0".to_string(),
            )),
            size => Ok(size),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    pub fn analytics_days(&self) -> u32 {
        self.analytics_days.unwrap_or(DEFAULT_ANALYTICS_DAYS)
    }

    pub(crate) fn apply_env(&mut self) {
        if let Some(url) = env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
        {
            debug!(%url, "api base url overridden from environment");
            self.api_base_url = Some(url.trim().to_string());
        }
    }
}

pub fn load(path: PathBuf) -> AppResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(path)?;
    let settings = serde_json::from_str(&raw)?;
    Ok(settings)
}

pub fn save(path: PathBuf, settings: &Settings) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(&path, payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::default();
        assert_eq!(settings.redirect_uri(), DEFAULT_REDIRECT_URI);
        assert_eq!(settings.page_size().expect("page size"), 20);
        assert_eq!(settings.debounce(), Duration::from_millis(500));
        assert_eq!(settings.analytics_days(), 30);
    }

    #[test]
    fn rejects_zero_page_size() {
        let settings = Settings {
            page_size: Some(0),
            ..Settings::default()
        };
        assert!(settings.page_size().is_err());
    }

    #[test]
    fn missing_file_loads_defaults_and_saved_file_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profiles").join("default.json");
        assert!(load(path.clone()).expect("load").api_base_url.is_none());

        let settings = Settings {
            api_base_url: Some("https://inbox.example.com".to_string()),
            page_size: Some(50),
            ..Settings::default()
        };
        save(path.clone(), &settings).expect("save");

        let loaded = load(path).expect("load");
        assert_eq!(loaded.api_base_url(), "https://inbox.example.com");
        assert_eq!(loaded.page_size().expect("page size"), 50);
    }
}
