//! Endpoint configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

use crate::model::ModelId;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_EXTRACT_PATH: &str = "/api/extract";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("EXTRACT_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),

    #[error("EXTRACT_MODEL is not a supported model: {0}")]
    UnknownModel(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where and how to reach the extraction endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub extract_path: String,
    /// No timeout when `None`; the request waits for the endpoint.
    pub timeout: Option<Duration>,
    pub default_model: ModelId,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            extract_path: DEFAULT_EXTRACT_PATH.to_string(),
            timeout: None,
            default_model: ModelId::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut config = Self::default();

        if let Ok(raw) = env::var("EXTRACT_BASE_URL") {
            config.base_url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
                var: "EXTRACT_BASE_URL",
                source,
            })?;
        }
        if let Ok(path) = env::var("EXTRACT_PATH") {
            config.extract_path = path;
        }
        if let Ok(raw) = env::var("EXTRACT_TIMEOUT_SECS") {
            config.timeout = Some(parse_timeout(&raw)?);
        }
        if let Ok(raw) = env::var("EXTRACT_MODEL") {
            config.default_model = raw
                .parse()
                .map_err(|_| ConfigError::UnknownModel(raw.clone()))?;
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the extraction endpoint.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        self.base_url
            .join(&self.extract_path)
            .map_err(|source| ConfigError::InvalidUrl {
                var: "EXTRACT_PATH",
                source,
            })
    }
}

pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
