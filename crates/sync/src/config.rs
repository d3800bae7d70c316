use crate::error::{Result, SyncError};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const ENV_API_URL: &str = "ROSTER_API_URL";
pub const ENV_DEBOUNCE_MS: &str = "ROSTER_DEBOUNCE_MS";

/// Session configuration.
///
/// Layered lowest to highest: [`Default`], a TOML file, environment
/// variables, then whatever the caller overrides field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    /// A cached collection younger than this is served without a refetch.
    pub stale_time: Duration,
    /// Quiet period for search input.
    pub debounce: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            stale_time: Duration::from_secs(5 * 60),
            debounce: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    api_base_url: Option<String>,
    request_timeout_ms: Option<u64>,
    stale_time_secs: Option<u64>,
    debounce_ms: Option<u64>,
}

impl RosterConfig {
    /// Defaults, then `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|err| {
                    SyncError::config(format!("cannot read {}: {err}", path.display()))
                })?;
                Self::from_toml_str(&raw)?
            }
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(raw)
            .map_err(|err| SyncError::config(format!("config parse error: {err}")))?;
        let defaults = Self::default();
        let config = Self {
            api_base_url: raw.api_base_url.unwrap_or(defaults.api_base_url),
            request_timeout: raw
                .request_timeout_ms
                .map_or(defaults.request_timeout, Duration::from_millis),
            stale_time: raw
                .stale_time_secs
                .map_or(defaults.stale_time, Duration::from_secs),
            debounce: raw.debounce_ms.map_or(defaults.debounce, Duration::from_millis),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_DEBOUNCE_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                SyncError::config(format!("{ENV_DEBOUNCE_MS} must be an integer, got {raw:?}"))
            })?;
            self.debounce = Duration::from_millis(ms);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SyncError::config(format!(
                "api_base_url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(SyncError::config("request_timeout must be positive"));
        }
        Ok(())
    }
}
