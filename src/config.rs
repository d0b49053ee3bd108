//! Top-level client configuration.
//!
//! Configuration is stored in `.userdeck/config.yaml` and includes:
//! - The directory API base URL and optional API key
//! - The merge policy applied after an update
//! - HTTP timeouts
//!
//! `USERDECK_BASE_URL`, `USERDECK_API_KEY` and `USERDECK_TOKEN` override the file.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UserdeckError};
use crate::types::CONFIG_DIR;

pub const DEFAULT_BASE_URL: &str = "https://reqres.in/api";

/// Which side wins when an update response disagrees with the fields the client sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Trust the fields we just sent; take the server's value only for fields we did not send.
    /// Needed for mock backends that echo stale values instead of persisting writes.
    #[default]
    ClientWins,
    /// Trust the server's canonical record entirely.
    ServerWins,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::ClientWins => write!(f, "client_wins"),
            MergePolicy::ServerWins => write!(f, "server_wins"),
        }
    }
}

/// Main configuration structure
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory API root, e.g. `https://reqres.in/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static API key sent as `x-api-key`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub merge_policy: MergePolicy,

    /// Total request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            merge_policy: MergePolicy::default(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("merge_policy", &self.merge_policy)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        PathBuf::from(CONFIG_DIR).join("config.yaml")
    }

    /// Load configuration from the default path, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, or return defaults if not found
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            UserdeckError::Io(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later at request time.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            UserdeckError::Config(format!("invalid base_url '{}': {e}", self.base_url))
        })?;
        if url.cannot_be_a_base() {
            return Err(UserdeckError::Config(format!(
                "base_url '{}' cannot be used as a base URL",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(UserdeckError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the base URL from environment or config file
    pub fn base_url(&self) -> String {
        if let Ok(url) = env::var("USERDECK_BASE_URL")
            && !url.is_empty()
        {
            return url;
        }
        self.base_url.clone()
    }

    /// Get the API key from environment or config file
    pub fn api_key(&self) -> Option<String> {
        if let Ok(key) = env::var("USERDECK_API_KEY")
            && !key.is_empty()
        {
            return Some(key);
        }
        self.api_key.clone()
    }

    /// Bearer token handed to the CLI for this process only
    pub fn session_token() -> Option<String> {
        env::var("USERDECK_TOKEN").ok().filter(|t| !t.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.merge_policy, MergePolicy::ClientWins);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_config_from_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "base_url: http://localhost:8080/api\nmerge_policy: server_wins\ntimeout_secs: 5\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/api");
        assert_eq!(config.merge_policy, MergePolicy::ServerWins);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn test_config_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "base_url: not a url\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, UserdeckError::Config(_)));
    }

    #[test]
    fn test_config_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_base_url() {
        let config = Config::default();
        unsafe { env::set_var("USERDECK_BASE_URL", "http://127.0.0.1:9999/api") };
        assert_eq!(config.base_url(), "http://127.0.0.1:9999/api");
        unsafe { env::remove_var("USERDECK_BASE_URL") };
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }
}
