//! Configuration loading from TOML.
//!
//! Every key has a default, so an empty file (or no file at all, via
//! `AgrofeedConfig::default()`) yields a working setup pointed at the
//! public Yahoo Finance and Open-Meteo endpoints.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "AGROFEED/0.1.0";
pub const DEFAULT_COMMODITY_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// CBOT, where the grain and oilseed futures trade.
pub const DEFAULT_EXCHANGE_TIMEZONE: Tz = chrono_tz::America::Chicago;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AgrofeedConfig {
    pub commodity: CommodityConfig,
    pub weather: WeatherConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommodityConfig {
    /// Host root; the chart path is appended per request.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// IANA zone whose midnights bound the requested date range.
    pub exchange_timezone: Tz,
}

impl Default for CommodityConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMMODITY_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            exchange_timezone: DEFAULT_EXCHANGE_TIMEZONE,
        }
    }
}

impl CommodityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WeatherConfig {
    /// Full forecast endpoint URL.
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AgrofeedConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AgrofeedConfig = toml::from_str(contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = AgrofeedConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.commodity.base_url, DEFAULT_COMMODITY_BASE_URL);
        assert_eq!(cfg.commodity.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.commodity.exchange_timezone, chrono_tz::America::Chicago);
        assert_eq!(cfg.weather.base_url, DEFAULT_WEATHER_BASE_URL);
        assert_eq!(cfg.weather.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_override() {
        let cfg = AgrofeedConfig::from_toml_str(
            r#"
            [commodity]
            timeout_secs = 5
            exchange_timezone = "Europe/London"

            [weather]
            base_url = "http://localhost:8080/v1/forecast"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.commodity.timeout_secs, 5);
        assert_eq!(cfg.commodity.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(cfg.commodity.exchange_timezone, chrono_tz::Europe::London);
        assert_eq!(cfg.weather.base_url, "http://localhost:8080/v1/forecast");
        assert_eq!(cfg.weather.timeout_secs, 10);
    }

    #[test]
    fn test_bad_type_is_rejected() {
        let result = AgrofeedConfig::from_toml_str("[weather]\ntimeout_secs = \"ten\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let result = AgrofeedConfig::from_toml_str("[commodity]\nexchange_timezone = \"Chicago\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AgrofeedConfig::load("/tmp/agrofeed_no_such_config.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_example_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/agrofeed.example.toml");
        let cfg = AgrofeedConfig::load(path).unwrap();
        assert_eq!(cfg.weather.timeout_secs, 10);
        assert_eq!(cfg.commodity.base_url, DEFAULT_COMMODITY_BASE_URL);
        assert_eq!(cfg.commodity.exchange_timezone, DEFAULT_EXCHANGE_TIMEZONE);
    }
}
