use std::{env, str::FromStr, time::Duration};

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, GeminiConfig, LogFormat, LoggingConfig, MarkPolicy,
    RelayConfig, ServerConfig,
};
use crate::ai::inference::GEMINI_API_BASE;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| env::var(key).ok())
}

impl AppConfig {
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("GEMINI_API_KEY").ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let production = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .is_some_and(|v| v.eq_ignore_ascii_case("production"));
        let server = ServerConfig {
            host: var("HOST").unwrap_or_else(|| {
                if production { "0.0.0.0" } else { "localhost" }.to_string()
            }),
            port: parse_or("PORT", var("PORT"), 3000)?,
        };

        let gemini = GeminiConfig {
            api_key: Some(api_key),
            model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            api_base: var("GEMINI_API_BASE").unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            timeout: var("GEMINI_TIMEOUT_SECS")
                .map(|v| parse_value::<u64>("GEMINI_TIMEOUT_SECS", &v))
                .transpose()?
                .map(Duration::from_secs),
        };

        let directories = DirectoryConfig {
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| "logs".to_string()),
            data_dir: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),
            categories_filename: var("CATEGORIES_FILENAME")
                .unwrap_or_else(|| "categories.json".to_string()),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: var("LOG_FORMAT")
                .map(|v| v.parse::<LogFormat>())
                .transpose()?
                .unwrap_or_default(),
        };

        let relay = RelayConfig {
            mark_policy: var("DEDUP_MARK_POLICY")
                .map(|v| v.parse::<MarkPolicy>())
                .transpose()?
                .unwrap_or_default(),
            max_sessions: parse_or("RELAY_MAX_SESSIONS", var("RELAY_MAX_SESSIONS"), 1024)?,
            session_idle_ttl: Duration::from_secs(parse_or(
                "RELAY_SESSION_IDLE_SECS",
                var("RELAY_SESSION_IDLE_SECS"),
                3600,
            )?),
        };

        Ok(Self {
            server,
            gemini,
            directories,
            logging,
            relay,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
