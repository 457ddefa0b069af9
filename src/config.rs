use crate::error::ConfigError;
use std::env;
use std::time::Duration;

const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;
const DEFAULT_CELEBRATION_SECS: u64 = 5;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub results_base_url: String,
    pub election_id: String,
    pub refresh_interval: Duration,
    pub celebration_duration: Duration,
    pub http_timeout: Duration,
}

impl Config {
    /// Reads settings from the process environment. Call `dotenvy::dotenv()`
    /// first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let results_base_url = required(&lookup, "RESULTS_BASE_URL")?;
        if !(results_base_url.starts_with("http://") || results_base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "RESULTS_BASE_URL",
                value: results_base_url,
                reason: "expected an http(s) URL".to_string(),
            });
        }

        Ok(Self {
            results_base_url: results_base_url.trim_end_matches('/').to_string(),
            election_id: required(&lookup, "ELECTION_ID")?,
            refresh_interval: seconds(&lookup, "REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS)?,
            celebration_duration: seconds(&lookup, "CELEBRATION_SECS", DEFAULT_CELEBRATION_SECS)?,
            http_timeout: seconds(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn seconds<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(Duration::from_secs(default));
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::Invalid {
            key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
