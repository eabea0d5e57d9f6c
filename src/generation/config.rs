//! Generation service configuration

use std::time::Duration;
use thiserror::Error;

pub const BASE_URL_VAR: &str = "FGPT_BASE_URL";
pub const TIMEOUT_VAR: &str = "FGPT_GENERATION_TIMEOUT_SECS";

/// Upper bound on a single generation round trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const GENERATION_PATH: &str = "/openai";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} has invalid value `{value}`")]
    Invalid { var: &'static str, value: String },
}

/// Where and how long to talk to the generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub base_url: String,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl GenerationConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. A timeout of `0` disables it.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(BASE_URL_VAR))?;

        let timeout = match lookup(TIMEOUT_VAR) {
            None => Some(DEFAULT_TIMEOUT),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: TIMEOUT_VAR,
                        value: raw,
                    })
                }
            },
        };

        Ok(Self::new(base_url.trim()).with_timeout(timeout))
    }

    /// Full URL of the generation endpoint
    pub fn endpoint(&self) -> String {
        format!("{}{GENERATION_PATH}", self.base_url)
    }
}
