use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils;

pub const DEFAULT_BASE_URL: &str = "https://app.ticketmaster.com/discovery/v2/events.json";
const DEFAULT_COUNTRY_CODE: &str = "US";
const DEFAULT_FEATURED_CITY: &str = "New York";
const DEFAULT_CLASSIFICATION: &str = "music";
const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no Ticketmaster API key configured (set TICKETMASTER_API_KEY or run `event-finder set-key`)")]
    MissingApiKey,
    #[error("invalid base url {0}")]
    InvalidBaseUrl(String),
    #[error("config io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub country_code: String,
    pub featured_city: String,
    pub classification: String,
    pub page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            featured_city: DEFAULT_FEATURED_CITY.to_string(),
            classification: DEFAULT_CLASSIFICATION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Applies `TICKETMASTER_API_KEY` and `TICKETMASTER_BASE_URL` on top of the stored values.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("TICKETMASTER_API_KEY").ok(),
            std::env::var("TICKETMASTER_BASE_URL").ok(),
        )
    }

    fn with_overrides(mut self, api_key: Option<String>, base_url: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> Self {
        Self::load_from(utils::config_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let data = match read_config(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = ?path, "ignoring unreadable config: {err}");
                AppConfig::default()
            }
        };
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn read(&self) -> AppConfig {
        match self.data.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| ConfigError::Io("config mutex poisoned".to_string()))?;
        transform(&mut guard);
        write_config(&self.path, &guard)?;
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    serde_json::from_str(&contents).map_err(|err| ConfigError::Parse(err.to_string()))
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path);
    let contents =
        serde_json::to_string_pretty(config).map_err(|err| ConfigError::Parse(err.to_string()))?;
    fs::write(path, contents).map_err(|err| ConfigError::Io(err.to_string()))
}
