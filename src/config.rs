use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_PORT: u16 = 8501;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_MAX_UPLOAD_MB: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY not found in environment or .env file")]
    MissingApiKey,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid GEMINI_BASE_URL: {0}")]
    InvalidBaseUrl(String),
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub bind_address: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()`
    /// first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = get("GEMINI_API_KEY")
            .map(|value| value.trim().to_string())
            .ok_or(ConfigError::MissingApiKey)?;
        let model = get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = resolve_base_url(get("GEMINI_BASE_URL").as_deref())?;
        let timeout_secs = parse_or(
            "GEMINI_TIMEOUT_SECS",
            get("GEMINI_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "GEMINI_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        let port = parse_or("ANALYZER_PORT", get("ANALYZER_PORT"), DEFAULT_PORT)?;
        let bind = get("ANALYZER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let max_upload_mb = parse_or("MAX_UPLOAD_MB", get("MAX_UPLOAD_MB"), DEFAULT_MAX_UPLOAD_MB)?;

        Ok(Self {
            gemini: GeminiConfig {
                api_key,
                model: model.trim().trim_start_matches("models/").to_string(),
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            bind_address: format!("{}:{}", bind.trim(), port),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn resolve_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let raw = raw.unwrap_or(DEFAULT_BASE_URL).trim();
    let parsed = Url::parse(raw).map_err(|err| ConfigError::InvalidBaseUrl(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        scheme => Err(ConfigError::InvalidBaseUrl(format!("unsupported scheme: {scheme}"))),
    }
}
