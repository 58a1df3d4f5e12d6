use crate::core::scheduler::DEFAULT_REFRESH_INTERVAL_SECS;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is missing. Set it in the config file or via {1}")]
    Missing(&'static str, &'static str),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExchangeApiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Comma separated currency codes to request, e.g. "USD,GBP,JPY"
    #[serde(default)]
    pub currencies: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ExchangeApiConfig {
    fn default() -> Self {
        ExchangeApiConfig {
            api_key: String::new(),
            api_url: default_api_url(),
            currencies: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ExchangeApiConfig {
    pub fn currency_list(&self) -> Vec<String> {
        self.currencies
            .split(',')
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_api_url() -> String {
    "https://api.exchangerate.host/live".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_require_initial_rates() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub exchange: ExchangeApiConfig,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Fail startup when the first rate fetch fails
    #[serde(default = "default_require_initial_rates")]
    pub require_initial_rates: bool,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            exchange: ExchangeApiConfig::default(),
            refresh_interval_secs: default_refresh_interval_secs(),
            require_initial_rates: default_require_initial_rates(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl AppConfig {
    /// Loads the config file at `path`, or the default location, then
    /// applies environment overrides and validates the result.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    Self::load_from_path(&default_path)?
                } else {
                    debug!("No config file at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxconv", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Overrides exchange settings from `lookup`, normally the process
    /// environment. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = get("EXCHANGE_API_KEY") {
            self.exchange.api_key = key;
        }
        if let Some(url) = get("EXCHANGE_API_URL") {
            self.exchange.api_url = url;
        }
        if let Some(currencies) = get("EXCHANGE_API_CURRENCIES") {
            self.exchange.currencies = currencies;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchange.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("API key", "EXCHANGE_API_KEY"));
        }
        if self.exchange.api_url.trim().is_empty() {
            return Err(ConfigError::Missing("API URL", "EXCHANGE_API_URL"));
        }
        if self.exchange.currency_list().is_empty() {
            return Err(ConfigError::Missing(
                "Supported currency list",
                "EXCHANGE_API_CURRENCIES",
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}
