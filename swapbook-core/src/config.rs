//! Swapbook configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. Explicit overrides (CLI flags)
//! 2. `SWAPBOOK_BASE_URL` environment variable
//! 3. `config.yaml` in the platform config directory
//! 4. Built-in defaults
//!
//! ## Example
//!
//! ```yaml
//! base_url: https://particle.se/
//! timeout_seconds: 30
//! cache:
//!   enabled: true
//!   ttl_seconds: 900
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::favorites::FileBackend;

/// Default origin of the engine swap database
pub const DEFAULT_BASE_URL: &str = "https://particle.se/";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "SWAPBOOK_BASE_URL";

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Base URL must start with http:// or https:// (got '{0}')")]
    InvalidBaseUrl(String),

    #[error("Could not determine a home directory for swapbook data")]
    NoHomeDirectory,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapbookConfig {
    /// Origin serving `engine_swap_database.json`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout for the catalog fetch
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Favorites file; defaults to `<data dir>/favorites/favorite_keys.json`
    #[serde(default)]
    pub favorites_path: Option<PathBuf>,

    /// Catalog cache directory; defaults to the platform cache directory
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

/// Catalog cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    15 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for SwapbookConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            cache: CacheConfig::default(),
            favorites_path: None,
            cache_dir: None,
        }
    }
}

impl SwapbookConfig {
    /// Load from the default location, then apply the environment override
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir()?.join(CONFIG_FILE);
        Self::load_from_path(&path)
    }

    /// Load from a specific file (defaults if it doesn't exist), then apply the env override
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml_ng::Error> {
        // An empty file is a valid, all-defaults config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(self)
    }

    /// Apply `SWAPBOOK_BASE_URL` if set and non-empty
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                tracing::debug!("Base URL overridden by {}: {}", BASE_URL_ENV, base_url);
                self.base_url = base_url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    /// Effective favorites file
    pub fn favorites_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.favorites_path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileBackend::in_dir(&Self::data_dir()?).path().to_path_buf()),
        }
    }

    /// Effective catalog cache directory
    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => project_dirs()
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .or_else(|| dirs::cache_dir().map(|d| d.join("swapbook")))
                .ok_or(ConfigError::NoHomeDirectory),
        }
    }

    /// Platform config directory
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        project_dirs()
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| dirs::config_dir().map(|d| d.join("swapbook")))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Platform data directory (favorites live here)
    pub fn data_dir() -> Result<PathBuf, ConfigError> {
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .or_else(|| dirs::data_dir().map(|d| d.join("swapbook")))
            .ok_or(ConfigError::NoHomeDirectory)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("se", "particle", "swapbook")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SwapbookConfig::default();
        assert_eq!(config.base_url, "https://particle.se/");
        assert_eq!(config.timeout_seconds, 30);
        assert!(config.cache.enabled);
        assert_eq!(config.cache_ttl(), Duration::from_secs(900));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = SwapbookConfig::from_yaml(
            r#"
base_url: http://localhost:8000/
cache:
  enabled: false
"#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8000/");
        assert_eq!(config.timeout_seconds, 30);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_seconds, 900);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(SwapbookConfig::from_yaml("").unwrap(), SwapbookConfig::default());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = SwapbookConfig {
            base_url: "ftp://particle.se/".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_explicit_paths_win() {
        let config = SwapbookConfig {
            favorites_path: Some(PathBuf::from("/tmp/favs.json")),
            cache_dir: Some(PathBuf::from("/tmp/cache")),
            ..Default::default()
        };
        assert_eq!(config.favorites_path().unwrap(), PathBuf::from("/tmp/favs.json"));
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/cache"));
    }
}
