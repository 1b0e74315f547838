//! Configuration Management
//!
//! Handles persistent configuration storage for tcdb. Values are resolved
//! in order: config file, then environment, then CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cloud::auth::{ENV_REGION, ENV_SECRET_ID, ENV_SECRET_KEY, ENV_SECURITY_TOKEN};
use crate::cloud::ratelimit::DEFAULT_RATE;
use crate::retry::{READ_RETRY_TIMEOUT, WRITE_RETRY_TIMEOUT};

/// Region used when nothing else is configured
pub const DEFAULT_REGION: &str = "ap-guangzhou";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub region: Option<String>,
    pub secret_id: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    #[serde(skip_serializing)]
    pub security_token: Option<String>,
    /// Send every call to this base URL instead of `<product>.<domain>`
    pub endpoint: Option<String>,
    pub domain: Option<String>,
    pub write_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Requests per second per action; 0 disables limiting
    pub rate_limit: u32,
    pub rate_limit_overrides: HashMap<String, u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            secret_id: None,
            secret_key: None,
            security_token: None,
            endpoint: None,
            domain: None,
            write_timeout_secs: WRITE_RETRY_TIMEOUT.as_secs(),
            read_timeout_secs: READ_RETRY_TIMEOUT.as_secs(),
            rate_limit: DEFAULT_RATE,
            rate_limit_overrides: HashMap::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tcdb").join("config.json"))
    }

    /// Load configuration from the default location, then apply environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to disk; secrets are never written
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Override values from `TENCENTCLOUD_*` environment variables
    pub fn apply_env(&mut self) {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(v) = var(ENV_SECRET_ID) {
            self.secret_id = Some(v);
        }
        if let Some(v) = var(ENV_SECRET_KEY) {
            self.secret_key = Some(v);
        }
        if let Some(v) = var(ENV_SECURITY_TOKEN) {
            self.security_token = Some(v);
        }
        if let Some(v) = var(ENV_REGION) {
            self.region = Some(v);
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint).with_context(|| format!("Invalid endpoint `{}`", endpoint))?;
        }
        Ok(())
    }

    /// Get effective region (CLI/env > config > default)
    pub fn effective_region(&self) -> String {
        self.region
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_region(), "ap-guangzhou");
        assert_eq!(config.write_timeout(), Duration::from_secs(300));
        assert_eq!(config.read_timeout(), Duration::from_secs(180));
        assert_eq!(config.rate_limit, 20);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"region": "ap-shanghai", "rate_limit": 5}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.effective_region(), "ap-shanghai");
        assert_eq!(config.rate_limit, 5);
        assert_eq!(config.read_timeout_secs, 180);
    }

    #[test]
    fn test_save_omits_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            secret_id: Some("AKID".into()),
            secret_key: Some("very-secret".into()),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("AKID"));
        assert!(!written.contains("very-secret"));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"endpoint": "not a url"}"#).unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_empty_region_falls_back() {
        let config = Config {
            region: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.effective_region(), DEFAULT_REGION);
    }
}
