//! Configuration for etf_service_rust

use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    // Listener
    pub host: String,
    pub port: u16,

    // Catalog files
    pub tickers_path: PathBuf,
    pub meta_path: PathBuf,

    // Listing cache
    pub cache_ttl_secs: u64,

    // Quote provider
    pub yahoo_base_url: String,
    pub provider_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            tickers_path: PathBuf::from("data/etf-tickers.json"),
            meta_path: PathBuf::from("data/etf-meta.json"),
            cache_ttl_secs: 300,
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            provider_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let cache_ttl_secs = parse_u64("ETF_CACHE_TTL_SECS", defaults.cache_ttl_secs)?;
        let provider_timeout_secs =
            parse_u64("PROVIDER_TIMEOUT_SECS", defaults.provider_timeout_secs)?;

        if cache_ttl_secs == 0 {
            return Err(anyhow!("ETF_CACHE_TTL_SECS must be > 0"));
        }
        if provider_timeout_secs == 0 {
            return Err(anyhow!("PROVIDER_TIMEOUT_SECS must be > 0"));
        }

        let yahoo_base_url = env::var("YAHOO_BASE_URL")
            .unwrap_or(defaults.yahoo_base_url)
            .trim_end_matches('/')
            .to_string();
        if !yahoo_base_url.starts_with("http") {
            return Err(anyhow!("YAHOO_BASE_URL must be an http(s) URL"));
        }

        Ok(Self {
            host: env::var("ETF_SERVICE_HOST").unwrap_or(defaults.host),
            port: parse_u16("PORT", defaults.port)?,
            tickers_path: env::var("ETF_TICKERS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.tickers_path),
            meta_path: env::var("ETF_META_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.meta_path),
            cache_ttl_secs,
            yahoo_base_url,
            provider_timeout_secs,
        })
    }

    /// Get bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}

/// Parse environment variable as u16 with default fallback
fn parse_u16(var_name: &str, default: u16) -> Result<u16> {
    match env::var(var_name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid port", var_name)),
        Err(_) => Ok(default),
    }
}
