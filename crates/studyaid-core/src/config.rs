//! Application configuration management.
//!
//! Configuration is stored at `~/.config/studyaid/config.json`. Every field
//! has a default, so a missing or partial file is fine. Environment variables
//! override the file for the current run only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::StorageKind;
use crate::cookies::CookiePolicy;

/// Application name used for config/cache/data directory paths
const APP_NAME: &str = "studyaid";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Persistent cookie jar file name, inside the data directory
const COOKIE_FILE: &str = "cookies.json";

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_WEB_URL: &str = "http://localhost:3000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Anything faster just burns CPU re-reading the jar.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

pub const ENV_API_URL: &str = "STUDYAID_API_URL";
pub const ENV_WEB_URL: &str = "STUDYAID_WEB_URL";
pub const ENV_POLL_INTERVAL_MS: &str = "STUDYAID_POLL_INTERVAL_MS";
pub const ENV_STORAGE: &str = "STUDYAID_STORAGE";
pub const ENV_EMAIL: &str = "STUDYAID_EMAIL";
pub const ENV_PASSWORD: &str = "STUDYAID_PASSWORD";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find {0} directory")]
    NoDirectory(&'static str),

    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub web_app_url: String,
    pub poll_interval_ms: u64,
    pub storage: StorageKind,
    pub cookie: CookiePolicy,
    pub persist_cookies: bool,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            web_app_url: DEFAULT_WEB_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            storage: StorageKind::default(),
            cookie: CookiePolicy::default(),
            persist_cookies: true,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Log files live here
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        let cache_dir = dirs::cache_dir().ok_or(ConfigError::NoDirectory("cache"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// The session store file and the persistent cookie jar live here
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoDirectory("data"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn cookie_jar_path(data_dir: &Path) -> PathBuf {
        data_dir.join(COOKIE_FILE)
    }

    /// Apply `STUDYAID_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(url) = get(ENV_WEB_URL) {
            self.web_app_url = url;
        }
        if let Some(ms) = get(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = ms.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_POLL_INTERVAL_MS,
                reason: format!("'{}' is not a number of milliseconds", ms),
            })?;
        }
        if let Some(kind) = get(ENV_STORAGE) {
            self.storage = kind.parse().map_err(|reason| ConfigError::InvalidValue {
                field: ENV_STORAGE,
                reason,
            })?;
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.last_email = Some(email);
        }
        Ok(())
    }

    /// Check both URLs and clamp the poll interval.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.api_url()?;
        self.web_origin()?;
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            tracing::warn!(
                configured = self.poll_interval_ms,
                minimum = MIN_POLL_INTERVAL_MS,
                "Poll interval too small, clamping"
            );
            self.poll_interval_ms = MIN_POLL_INTERVAL_MS;
        }
        Ok(())
    }

    pub fn api_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api_base_url).map_err(|source| ConfigError::InvalidUrl {
            field: "api_base_url",
            source,
        })
    }

    /// Origin the session cookie belongs to
    pub fn web_origin(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.web_app_url).map_err(|source| ConfigError::InvalidUrl {
            field: "web_app_url",
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Password from `STUDYAID_PASSWORD`, for scripted one-shot logins.
pub fn env_password() -> Option<String> {
    std::env::var(ENV_PASSWORD).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;
    use crate::cookies::SameSite;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.web_app_url, "http://localhost:3000");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.storage, StorageKind::File);
        assert!(config.persist_cookies);
        assert_eq!(config.cookie.name, "access_token");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.last_email = Some("ada@example.com".to_string());
        config.cookie.same_site = SameSite::Strict;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"poll_interval_ms": 500, "storage": "memory"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.web_app_url, DEFAULT_WEB_URL);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                (ENV_API_URL, "https://api.example.com"),
                (ENV_WEB_URL, ""),
                (ENV_POLL_INTERVAL_MS, "750"),
                (ENV_STORAGE, "keyring"),
                (ENV_EMAIL, "ada@example.com"),
            ]))
            .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.web_app_url, DEFAULT_WEB_URL);
        assert_eq!(config.poll_interval_ms, 750);
        assert_eq!(config.storage, StorageKind::Keyring);
        assert_eq!(config.last_email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[(ENV_POLL_INTERVAL_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: ENV_POLL_INTERVAL_MS, .. }));

        let err = config
            .apply_overrides(env(&[(ENV_STORAGE, "cloud")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: ENV_STORAGE, .. }));
    }

    #[test]
    fn test_validate_clamps_interval() {
        let mut config = Config {
            poll_interval_ms: 5,
            ..Config::default()
        };
        config.validate().unwrap();
        assert_eq!(config.poll_interval_ms, MIN_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = Config {
            web_app_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "web_app_url", .. })
        ));
    }
}
