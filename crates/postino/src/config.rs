//! Configuration loading from environment variables.

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Dates service credentials loaded from environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Where and how to reach the dates API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root without trailing slash, e.g. `http://127.0.0.1:5000`
    pub base_url: String,
    /// Logged in with before the first call when present
    pub credentials: Option<Credentials>,
    /// Deadline for each request
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment.
    ///
    /// Reads `DATES_API_URL`, `DATES_USER`, `DATES_PASSWORD` and
    /// `DATES_TIMEOUT_SECS`, either from the environment or from a `.env`
    /// file.
    pub fn from_env() -> Result<Self, ClientError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("DATES_API_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let credentials = match (get("DATES_USER"), get("DATES_PASSWORD")) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ClientError::Config(
                    "DATES_USER is set but DATES_PASSWORD is not".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ClientError::Config(
                    "DATES_PASSWORD is set but DATES_USER is not".to_string(),
                ))
            }
        };

        let timeout = match get("DATES_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ClientError::Config(format!("DATES_TIMEOUT_SECS is not a number: {}", raw))
                })?;
                if secs == 0 {
                    return Err(ClientError::Config(
                        "DATES_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            credentials,
            timeout,
        })
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = normalize_base_url(url);
        self
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
