use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_API_PREFIX: &str = "/admin/api/v1";

pub const ENV_BASE_URL: &str = "CRC_BASE_URL";
pub const ENV_USERNAME: &str = "CRC_USERNAME";
pub const ENV_PASSWORD: &str = "CRC_PASSWORD";

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_limit() -> u32 {
    20
}

fn default_max_retries() -> u32 {
    3
}

#[derive(Clone, Deserialize)]
pub struct ConsoleConfig {
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl ConsoleConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_prefix: default_api_prefix(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            default_limit: default_limit(),
            max_retries: default_max_retries(),
        }
    }

    /// `base_url` joined with `api_prefix`, without a trailing slash.
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{prefix}")
        }
    }
}

impl fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("base_url", &self.base_url)
            .field("api_prefix", &self.api_prefix)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("default_limit", &self.default_limit)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub console: ConsoleConfig,
}

impl Config {
    /// Loads `config.toml` from the working directory, then applies
    /// `.env` and process environment overrides.
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::from_path("config.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        info!("Config: {:?}", config);
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml_str(&config_str)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str).context("parsing config")?;
        if config.console.base_url.trim().is_empty() {
            anyhow::bail!("console.base_url must not be empty");
        }
        if config.console.default_limit == 0 {
            anyhow::bail!("console.default_limit must be positive");
        }
        Ok(config)
    }

    /// Non-empty values from `lookup` replace the file's.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(base_url) = get(ENV_BASE_URL) {
            self.console.base_url = base_url;
        }
        if let Some(username) = get(ENV_USERNAME) {
            self.console.username = Some(username);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.console.password = Some(password);
        }
    }
}
