use std::{str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub categories_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mark_policy: MarkPolicy,
    pub max_sessions: usize,
    pub session_idle_ttl: Duration,
}

/// When submitted URLs are recorded as processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkPolicy {
    /// Before the model call; a failed batch is not resubmitted.
    #[default]
    Optimistic,
    /// Only after the completion was parsed.
    OnSuccess,
}

impl FromStr for MarkPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(MarkPolicy::Optimistic),
            "on_success" | "on-success" => Ok(MarkPolicy::OnSuccess),
            _ => Err(ConfigError::Invalid {
                key: "DEDUP_MARK_POLICY",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
