//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: service
//! endpoints, the login id prefix, timing, and which credential store to use.
//!
//! Configuration is stored at `~/.config/tradedge/config.json`. Missing
//! fields take their defaults, and a few can be overridden from the
//! environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "tradedge";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_PROFILE_URL: &str = "https://gateway.twmresearchalert.com/kyc";
const DEFAULT_TRANSACTIONS_URL: &str = "https://tradedge-server.onrender.com/api/userTransactionsById";

/// Prefix the login provider puts on user ids.
const DEFAULT_USER_ID_PREFIX: &str = "LNUSR";

/// How long a login error banner stays up.
const DEFAULT_LOGIN_ERROR_TTL_SECS: u64 = 3;

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where persisted credentials live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" => Ok(StorageBackend::Keyring),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub profile_url: String,
    pub transactions_url: String,
    pub user_id_prefix: String,
    pub login_error_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub storage: StorageBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            transactions_url: DEFAULT_TRANSACTIONS_URL.to_string(),
            user_id_prefix: DEFAULT_USER_ID_PREFIX.to_string(),
            login_error_ttl_secs: DEFAULT_LOGIN_ERROR_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            storage: StorageBackend::default(),
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("TRADEDGE_PROFILE_URL") {
            self.profile_url = url;
        }
        if let Ok(url) = std::env::var("TRADEDGE_TRANSACTIONS_URL") {
            self.transactions_url = url;
        }
        if let Ok(storage) = std::env::var("TRADEDGE_STORAGE") {
            self.storage = storage.parse()?;
        }
        Ok(())
    }

    pub fn login_error_ttl(&self) -> Duration {
        Duration::from_secs(self.login_error_ttl_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.user_id_prefix, "LNUSR");
        assert_eq!(config.login_error_ttl(), Duration::from_secs(3));
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storage": "keyring", "request_timeout_secs": 5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.storage, StorageBackend::Keyring);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.profile_url, DEFAULT_PROFILE_URL);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.transactions_url, DEFAULT_TRANSACTIONS_URL);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            login_error_ttl_secs: 10,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().login_error_ttl_secs, 10);
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("File".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!(" keyring ".parse::<StorageBackend>().unwrap(), StorageBackend::Keyring);
        assert!("s3".parse::<StorageBackend>().is_err());
    }
}
