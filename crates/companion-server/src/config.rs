//! Server configuration.

use anyhow::Result;
use companion_core::{mask_api_key, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Environment variable consulted when the config file has no API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_prefs_path")]
    pub prefs_path: PathBuf,
    #[serde(default = "default_events_url")]
    pub events_url: String,
    #[serde(default = "default_events_timeout_secs")]
    pub events_timeout_secs: u64,
    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Clone, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_deref().map(mask_api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("campus-companion")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    data_dir().join("interactions.db")
}

fn default_prefs_path() -> PathBuf {
    data_dir().join("preferences.json")
}

fn default_events_url() -> String {
    "http://127.0.0.1:8090/events.json".to_string()
}

fn default_events_timeout_secs() -> u64 {
    15
}

fn default_completion_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

fn default_completion_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

fn default_completion_timeout_secs() -> u64 {
    60
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_completion_base_url(),
            model: default_completion_model(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            prefs_path: default_prefs_path(),
            events_url: default_events_url(),
            events_timeout_secs: default_events_timeout_secs(),
            completion: CompletionConfig::default(),
        }
    }
}

impl CompletionConfig {
    /// API key from the config file, else from the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load config from default location (config/default.toml) or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }

        Ok(Config::default())
    }
}
