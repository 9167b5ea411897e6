//! Configuration loading
//!
//! `Config` is read from `~/.config/lumen/config.toml` (or an explicit path)
//! and falls back to defaults for anything missing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chat::ChatOptions;
use crate::llm::DEFAULT_BASE_URL;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Main configuration structure loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub gemini: GeminiConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::source_path(None) {
            Some(path) => Self::load_from(&path),
            None => Ok(Config::default()),
        }
    }

    /// File to load: `explicit` if given, else the default path if it exists
    pub fn source_path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_config_path().filter(|path| path.exists()),
        }
    }

    /// Load configuration from `path`, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the config directory path (~/.config/lumen)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("lumen"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log at debug level
    pub debug: bool,
}

/// Gemini backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Takes precedence over GEMINI_API_KEY / GOOGLE_API_KEY
    pub api_key: Option<String>,
}

impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 120,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub function_calling: bool,
    pub max_function_rounds: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let options = ChatOptions::default();
        Self {
            function_calling: options.function_calling,
            max_function_rounds: options.max_function_rounds,
        }
    }
}

impl From<&ChatConfig> for ChatOptions {
    fn from(config: &ChatConfig) -> Self {
        Self {
            function_calling: config.function_calling,
            max_function_rounds: config.max_function_rounds,
        }
    }
}
