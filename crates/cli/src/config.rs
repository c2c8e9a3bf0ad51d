//! Configuration loading from purser.toml.

use runtime::RunConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Model backend configuration.
    #[serde(default)]
    pub model: ModelConfig,

    /// Generation loop limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Model backend configuration.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API key. Falls back to the GOOGLE_API_KEY or
    /// GEMINI_API_KEY environment variable when unset.
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
        }
    }
}

/// Generation loop limits.
#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    /// Maximum tool rounds per request.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Deadline for each model call, in seconds.
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Deadline for each tool execution, in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            model_timeout_secs: default_model_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_max_rounds() -> u32 {
    5
}

fn default_model_timeout_secs() -> u64 {
    60
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the API key: config file first, then environment.
    ///
    /// Absence is a startup error so that no request ever reaches the
    /// backend without credentials.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.model.api_key {
            return Ok(key.clone());
        }
        std::env::var("GOOGLE_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .map_err(|_| ConfigError::MissingApiKey)
    }

    /// Build the orchestrator limits from config.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            max_rounds: self.limits.max_rounds,
            model_timeout: Duration::from_secs(self.limits.model_timeout_secs),
            tool_timeout: Duration::from_secs(self.limits.tool_timeout_secs),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error(
        "API key not configured: set model.api_key in purser.toml or the GOOGLE_API_KEY environment variable"
    )]
    MissingApiKey,
}
