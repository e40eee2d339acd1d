//! Studio configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const MIN_POLL_INTERVAL_SECS: u64 = 5;
pub const MAX_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_MAX_POLL_ERRORS: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_STORE_PATH: &str = "atelier-board.json";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `ATELIER_API_KEY_ENV` names a variable that is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// A value was present but malformed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for RemoteTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// How pollers pace themselves and when they give up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    /// Time between status checks for one task.
    pub interval: Duration,
    /// Consecutive transport failures tolerated before the task is failed.
    pub max_consecutive_errors: u32,
    /// Longest side of a placed generation result, in world units.
    pub fit_max_dimension: f64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_consecutive_errors: DEFAULT_MAX_POLL_ERRORS,
            fit_max_dimension: canvas::consts::FIT_MAX_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub poll: PollSettings,
    pub timeouts: RemoteTimeouts,
    pub store_path: PathBuf,
}

impl StudioConfig {
    /// Build typed studio config from environment variables.
    ///
    /// Optional:
    /// - `ATELIER_API_BASE_URL`: default `http://localhost:8000/api`
    /// - `ATELIER_API_KEY_ENV`: names the env var containing the bearer key
    /// - `ATELIER_POLL_INTERVAL_SECS`: default 5, clamped to 5..=10
    /// - `ATELIER_MAX_POLL_ERRORS`: default 5
    /// - `ATELIER_REQUEST_TIMEOUT_SECS`: default 60
    /// - `ATELIER_CONNECT_TIMEOUT_SECS`: default 10
    /// - `ATELIER_STORE_PATH`: default `atelier-board.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the key variable is named but unset, or the base
    /// URL is empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = parse_base_url(std::env::var("ATELIER_API_BASE_URL").ok().as_deref())?;

        let api_key = match std::env::var("ATELIER_API_KEY_ENV") {
            Ok(key_var) => Some(std::env::var(&key_var).map_err(|_| ConfigError::MissingApiKey { var: key_var })?),
            Err(_) => None,
        };

        let poll = PollSettings {
            interval: Duration::from_secs(clamp_poll_interval(env_parse(
                "ATELIER_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            ))),
            max_consecutive_errors: env_parse("ATELIER_MAX_POLL_ERRORS", DEFAULT_MAX_POLL_ERRORS).max(1),
            ..PollSettings::default()
        };
        let timeouts = RemoteTimeouts {
            request_secs: env_parse("ATELIER_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("ATELIER_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let store_path =
            std::env::var("ATELIER_STORE_PATH").map_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from);

        Ok(Self { api_base_url, api_key, poll, timeouts, store_path })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.unwrap_or(DEFAULT_API_BASE_URL).trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(ConfigError::Parse("ATELIER_API_BASE_URL is empty".into()));
    }
    Ok(url.to_string())
}

fn clamp_poll_interval(secs: u64) -> u64 {
    secs.clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
