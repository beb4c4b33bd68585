//! Process configuration, read once from the environment at startup.
//!
//! Every loader has a `from_lookup` form taking a closure so tests can supply
//! variables without touching the process environment.

use crate::{ConfigError, SamplingParams};
use std::time::Duration;
use tracing::debug;

pub const TAKO_API_KEY: &str = "TAKO_API_KEY";
pub const TAKO_API_BASE_URL: &str = "TAKO_API_BASE_URL";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const POLL_INTERVAL_SECONDS: &str = "POLL_INTERVAL_SECONDS";
pub const REPLY_WINDOW_MINUTES: &str = "REPLY_WINDOW_MINUTES";
pub const BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_TAKO_API_BASE_URL: &str = "https://open-api.tako.so/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 1800;
pub const DEFAULT_REPLY_WINDOW_MINUTES: u64 = 25;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Loads `.env` from the working directory. A missing file is fine.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::EnvFile {
            reason: e.to_string(),
        }),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingEnvironmentVariable {
            var_name: key.to_string(),
        }),
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            field: key.to_string(),
            value: raw,
        }),
    }
}

fn base_url<F>(lookup: &F, key: &str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = optional(lookup, key).unwrap_or_else(|| default.to_string());
    url::Url::parse(&raw).map_err(|_| ConfigError::InvalidValue {
        field: key.to_string(),
        value: raw.clone(),
    })?;
    Ok(raw.trim_end_matches('/').to_string())
}

/// Credentials and endpoint for the Tako open API.
#[derive(Debug, Clone)]
pub struct TakoConfig {
    pub api_key: String,
    pub base_url: String,
}

impl TakoConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(&lookup, TAKO_API_KEY)?,
            base_url: base_url(&lookup, TAKO_API_BASE_URL, DEFAULT_TAKO_API_BASE_URL)?,
        })
    }
}

/// Provider credentials, model and sampling for comment generation.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub sampling: SamplingParams,
}

impl LlmConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(&lookup, OPENAI_API_KEY)?,
            model: optional(&lookup, OPENAI_MODEL)
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: base_url(&lookup, OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL)?,
            sampling: SamplingParams::default(),
        })
    }
}

/// Cadence and eligibility window of the polling loop.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub polling_interval: Duration,
    pub reply_window_minutes: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            polling_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
            reply_window_minutes: DEFAULT_REPLY_WINDOW_MINUTES,
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = parse_u64(&lookup, POLL_INTERVAL_SECONDS, DEFAULT_POLL_INTERVAL_SECONDS)?;
        if interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: POLL_INTERVAL_SECONDS.to_string(),
                value: "0".to_string(),
            });
        }

        Ok(Self {
            polling_interval: Duration::from_secs(interval),
            reply_window_minutes: parse_u64(
                &lookup,
                REPLY_WINDOW_MINUTES,
                DEFAULT_REPLY_WINDOW_MINUTES,
            )?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            bind_addr: optional(&lookup, BIND_ADDR)
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }
}
