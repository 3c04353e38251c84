use anyhow::{anyhow, Result};
use interest_profile::{
    StoreConfig, DEFAULT_EXPIRY_DAYS, DEFAULT_MAX_ENCODED_LEN, DEFAULT_STORAGE_KEY,
};
use serde::Deserialize;

use crate::models::{DEFAULT_DISCOVERY_RATIO, DEFAULT_MINIMUM_SCORE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // HTTP server config
    pub http_host: String,
    pub http_port: u16,

    // Interest cookie
    pub cookie_name: String,
    pub cookie_expiry_days: i64,
    pub max_cookie_bytes: usize,
    /// Only send the cookie over HTTPS
    pub cookie_secure: bool,

    // Profile summary sizes
    pub summary_top: usize,
    pub summary_recent: usize,

    // Recommendation defaults
    pub default_minimum_score: f64,
    pub discovery_ratio: f64,

    // Observability
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_host: "0.0.0.0".to_string(),
            http_port: 8090,
            cookie_name: DEFAULT_STORAGE_KEY.to_string(),
            cookie_expiry_days: DEFAULT_EXPIRY_DAYS,
            max_cookie_bytes: DEFAULT_MAX_ENCODED_LEN,
            cookie_secure: false,
            summary_top: 5,
            summary_recent: 3,
            default_minimum_score: DEFAULT_MINIMUM_SCORE,
            discovery_ratio: DEFAULT_DISCOVERY_RATIO,
            log_format: "text".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = config::Config::builder()
            .set_default("http_host", defaults.http_host)?
            .set_default("http_port", i64::from(defaults.http_port))?
            .set_default("cookie_name", defaults.cookie_name)?
            .set_default("cookie_expiry_days", defaults.cookie_expiry_days)?
            .set_default("max_cookie_bytes", defaults.max_cookie_bytes as i64)?
            .set_default("cookie_secure", defaults.cookie_secure)?
            .set_default("summary_top", defaults.summary_top as i64)?
            .set_default("summary_recent", defaults.summary_recent as i64)?
            .set_default("default_minimum_score", defaults.default_minimum_score)?
            .set_default("discovery_ratio", defaults.discovery_ratio)?
            .set_default("log_format", defaults.log_format)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP port must be greater than 0"));
        }

        if self.cookie_name.is_empty()
            || !self
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(anyhow!(
                "Cookie name must be non-empty and contain only [A-Za-z0-9_-]"
            ));
        }

        if self.cookie_expiry_days <= 0 {
            return Err(anyhow!("Cookie expiry must be at least one day"));
        }

        if self.max_cookie_bytes < 256 || self.max_cookie_bytes > 4096 {
            return Err(anyhow!("Max cookie bytes must be between 256 and 4096"));
        }

        if !(0.0..=1.0).contains(&self.default_minimum_score) {
            return Err(anyhow!("Default minimum score must be within [0, 1]"));
        }

        if !(0.0..=1.0).contains(&self.discovery_ratio) {
            return Err(anyhow!("Discovery ratio must be within [0, 1]"));
        }

        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            storage_key: self.cookie_name.clone(),
            expiry_days: self.cookie_expiry_days,
            max_encoded_len: self.max_cookie_bytes,
            summary_top: self.summary_top,
            summary_recent: self.summary_recent,
        }
    }
}
