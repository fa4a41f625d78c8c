//! Configuration management for the video console.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Status polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Public viewer settings
    #[serde(default)]
    pub public: PublicConfig,

    /// Quiz settings
    #[serde(default)]
    pub quiz: QuizConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the video-processing backend
    pub base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Status polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval between status polls in milliseconds
    pub interval_ms: u64,
}

/// Public viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Origin used when building shareable links
    pub share_base_url: String,

    /// Where the backend serves stored video files
    pub static_videos_url: String,

    /// Number of most recent chat turns sent with each question
    pub chat_history_limit: usize,
}

/// Quiz configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Time allowed for a quiz attempt in seconds
    pub time_limit_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_seconds: 30,
            user_agent: "video-console/0.1.0".to_string(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 3000 }
    }
}

impl Default for PublicConfig {
    fn default() -> Self {
        Self {
            share_base_url: "http://localhost:4200".to_string(),
            static_videos_url: "http://localhost:8000/static_videos".to_string(),
            chat_history_limit: 10,
        }
    }
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 15 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Reject values that would make the console misbehave
    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_ms == 0 {
            bail!("polling.interval_ms must be greater than zero");
        }
        if self.public.chat_history_limit == 0 {
            bail!("public.chat_history_limit must be greater than zero");
        }
        if self.api.base_url.trim().is_empty() {
            bail!("api.base_url must not be empty");
        }
        Ok(())
    }

    /// Interval between two status polls
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.polling.interval_ms)
    }

    /// Timeout applied to every backend request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_seconds)
    }

    /// Time allowed for one quiz attempt
    pub fn quiz_time_limit(&self) -> Duration {
        Duration::from_secs(self.quiz.time_limit_seconds)
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.log_dir)
    }
}
