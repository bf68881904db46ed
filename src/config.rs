//! Configuration loading and management for mailmind.
//!
//! Loads settings from `mailmind.toml` with environment variable overrides for sensitive data.
//! Every section has defaults, so a missing file is not an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the config file looked up in the working directory and the user config dir
pub const CONFIG_FILE: &str = "mailmind.toml";

/// Label used for action items when no prefix is configured and the model names no app
pub const DEFAULT_APP_NAME: &str = "MailMind";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
}

/// Whether the analysis is produced in Spanish only or Spanish + English
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LanguageMode {
    #[default]
    Bilingual,
    Single,
}

/// How the model reply is turned into a displayable result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One JSON object with a fixed schema
    #[default]
    Structured,
    /// Free text split into language halves on a marker
    Split,
}

/// Chat model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier (e.g., "gpt-4o-mini")
    pub id: String,
    /// Sampling temperature in [0, 1]
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,
    /// HTTP timeout for a single completion request
    pub timeout_secs: u64,
}

/// Analysis behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub language_mode: LanguageMode,
    pub strategy: Strategy,
    /// Label prepended to every action item. Falls back to the detected main app.
    pub action_prefix: Option<String>,
    /// Separator candidates for split mode, in priority order
    pub split_markers: Vec<String>,
}

/// API keys configuration (loaded from environment)
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub openai_key: Option<String>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("openai_key", &self.openai_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location (mailmind.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no {} found, using defaults", CONFIG_FILE);
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        debug!(path = %path.display(), "loaded config");

        config.apply_env();
        Ok(config)
    }

    /// Parse and validate configuration text without touching the environment
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.api.openai_key = Some(key);
            }
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("mailmind")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }

    /// Reject values the model endpoint would refuse anyway
    pub fn validate(&self) -> Result<(), ConfigError> {
        let temperature = self.model.temperature;
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "model.temperature".to_string(),
                message: format!("{} is outside [0, 1]", temperature),
            });
        }
        if self.model.max_output_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                key: "model.max_output_tokens".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.model.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model.id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get the API key for the chat endpoint
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api
            .openai_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("openai".to_string()))
    }

    /// Render the effective configuration with the key masked
    pub fn to_masked_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        if shown.api.openai_key.is_some() {
            shown.api.openai_key = Some("***".to_string());
        }
        toml::to_string_pretty(&shown)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_output_tokens: 1200,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            language_mode: LanguageMode::default(),
            strategy: Strategy::default(),
            action_prefix: None,
            split_markers: crate::split::DEFAULT_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}
