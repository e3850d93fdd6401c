//! Configuration management for ssoadm

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default invite lifetime when no expiry is given (hours)
pub const DEFAULT_INVITE_HOURS: i64 = 2;

/// Identity-provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base API URL, e.g. `https://sso.example.com/api/v3`
    pub api_url: String,

    /// Bearer token for the admin API
    pub api_token: String,

    /// Group new users are added to
    #[serde(default)]
    pub group_id: String,

    /// Enrollment flow used for invitations
    #[serde(default)]
    pub flow_id: String,

    /// Domain for default email addresses and invite links
    pub base_domain: String,
}

/// Local encrypted cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path of the encrypted snapshot file
    pub snapshot_path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ssoadm")
        .join("users.db")
}

/// Optional link-shortener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    /// Shortener endpoint, e.g. `https://s.example.com/rest/v3/short-urls`
    pub api_url: String,
    pub api_token: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub shortener: Option<ShortenerConfig>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file (YAML or JSON), with environment
    /// variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let content = Self::substitute_env_vars(&content);

        let ext = path_ref.extension().and_then(|s| s.to_str());
        let config: Config = if ext == Some("yaml") || ext == Some("yml") {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Substitute environment variables in config content
    /// Supports ${VAR_NAME} syntax
    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];

            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(full_match, &value);
            }
        }

        result
    }

    /// Create a config from environment variables only
    pub fn from_env() -> Result<Self> {
        let api_url = require_env("SSOADM_API_URL")?;
        let api_token = require_env("SSOADM_API_TOKEN")?;
        let base_domain = require_env("SSOADM_BASE_DOMAIN")?;

        let shortener = match (
            std::env::var("SSOADM_SHLINK_URL"),
            std::env::var("SSOADM_SHLINK_TOKEN"),
        ) {
            (Ok(api_url), Ok(api_token)) => Some(ShortenerConfig { api_url, api_token }),
            _ => None,
        };

        let config = Config {
            provider: ProviderConfig {
                api_url,
                api_token,
                group_id: std::env::var("SSOADM_GROUP_ID").unwrap_or_default(),
                flow_id: std::env::var("SSOADM_FLOW_ID").unwrap_or_default(),
                base_domain,
            },
            cache: CacheConfig {
                snapshot_path: std::env::var("SSOADM_SNAPSHOT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_snapshot_path()),
            },
            shortener,
            logging: LoggingConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file (format determined by extension)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        let ext = path_ref.extension().and_then(|s| s.to_str());
        let content = if ext == Some("yaml") || ext == Some("yml") {
            serde_yaml::to_string(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config to YAML: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config to JSON: {}", e)))?
        };

        std::fs::write(path_ref, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_url.is_empty() {
            return Err(Error::InvalidConfig(
                "Provider API URL is required".to_string(),
            ));
        }

        if self.provider.api_token.is_empty() {
            return Err(Error::InvalidConfig(
                "Provider API token is required".to_string(),
            ));
        }

        if self.provider.base_domain.is_empty() {
            return Err(Error::InvalidConfig(
                "Base domain is required".to_string(),
            ));
        }

        if self.cache.snapshot_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "Snapshot path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(Error::InvalidConfig(format!(
            "{} environment variable is required",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "provider": {
                "api_url": "https://sso.example.com/api/v3",
                "api_token": "token-123",
                "group_id": "g1",
                "flow_id": "f1",
                "base_domain": "example.com"
            },
            "cache": { "snapshot_path": "/tmp/users.db" }
        }"#
    }

    #[test]
    fn test_load_json_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, sample_json()).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.provider.base_domain, "example.com");
        assert_eq!(config.cache.snapshot_path, PathBuf::from("/tmp/users.db"));
        assert!(config.shortener.is_none());
    }

    #[test]
    fn test_load_yaml_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "provider:\n  api_url: https://sso.example.com/api/v3\n  api_token: token-123\n  base_domain: example.com\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.provider.api_token, "token-123");
        // Defaults apply when sections are omitted
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_token_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"provider": {"api_url": "https://x", "api_token": "", "base_domain": "x.com"}}"#,
        )
        .unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SSOADM_TEST_TOKEN_SUBST", "secret-from-env");
        let out = Config::substitute_env_vars("token: ${SSOADM_TEST_TOKEN_SUBST}");
        assert_eq!(out, "token: secret-from-env");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config: Config = serde_json::from_str(sample_json()).unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.provider.api_url, config.provider.api_url);
    }
}
