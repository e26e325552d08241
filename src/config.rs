//! Configuration loading and management for condensa.
//!
//! Loads settings from `condensa.toml` with environment variable overrides
//! for sensitive data. A missing file means built-in defaults: the app has
//! no mandatory configuration surface beyond the two model identifiers, and
//! both have defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. "127.0.0.1:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Inference API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the hosted inference API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier for summarisation
    #[serde(default = "default_summarization_model")]
    pub summarization_model: String,
    /// Model identifier for question answering
    #[serde(default = "default_qa_model")]
    pub qa_model: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// API credentials (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Bearer token for the inference API, if it requires one
    #[serde(default)]
    pub token: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location (condensa.toml in cwd or
    /// home), falling back to built-in defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env_overrides();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override sensitive values from environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("HF_API_TOKEN") {
            self.api.token = Some(token);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("condensa.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("condensa").join("condensa.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            summarization_model: default_summarization_model(),
            qa_model: default_qa_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_endpoint() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_summarization_model() -> String {
    "facebook/bart-large-cnn".to_string()
}

fn default_qa_model() -> String {
    "deepset/roberta-base-squad2".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}
