//! Dashboard configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honoured for local use.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the TransFleet backend API
    pub api_url: String,
    /// Directory holding persisted local storage (bearer token)
    pub storage_dir: PathBuf,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Refresh period for self-polling views
    pub poll_interval: Duration,
    /// Quiet period before a triggered fetch goes out
    pub debounce: Duration,
    /// Minimum spacing between two automatic fetches of one handle
    pub min_fetch_interval: Duration,

    // --- Optional non-interactive login ---
    pub login_email: Option<String>,
    pub login_password: Option<String>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api".to_string(),
            storage_dir: env::temp_dir().join("transfleet-test"),
            request_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(30),
            debounce: Duration::from_millis(1000),
            min_fetch_interval: Duration::from_millis(500),
            login_email: None,
            login_password: None,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            api_url: env::var("TRANSFLEET_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8000/api".to_string()),
            storage_dir: env::var("TRANSFLEET_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".transfleet")),
            request_timeout: Duration::from_secs(parse_var(
                "TRANSFLEET_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            poll_interval: Duration::from_secs(parse_var("TRANSFLEET_POLL_INTERVAL_SECS", 30)?),
            debounce: Duration::from_millis(parse_var("TRANSFLEET_DEBOUNCE_MS", 1000)?),
            min_fetch_interval: Duration::from_millis(parse_var("TRANSFLEET_MIN_INTERVAL_MS", 500)?),
            login_email: non_empty_var("TRANSFLEET_EMAIL"),
            login_password: non_empty_var("TRANSFLEET_PASSWORD"),
        })
    }

    /// Credentials for a non-interactive login, if both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.login_email, &self.login_password) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

fn parse_var(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
