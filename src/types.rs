//! Shared types for AGROFEED.
//!
//! The two record shapes map 1:1 onto the `commodity_prices` and
//! `weather_metrics` tables (minus the surrogate `id`). Field order is
//! the column order handed to the persistence layer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One trading day of a futures contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityPriceRecord {
    pub date: NaiveDate,
    pub close_price: f64,
    /// `None` when the provider omits volume for the day.
    pub volume: Option<i64>,
    pub symbol: String,
}

impl CommodityPriceRecord {
    /// Column names in output order.
    pub const COLUMNS: &'static [&'static str] = &["date", "close_price", "volume", "symbol"];
}

impl fmt::Display for CommodityPriceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.volume {
            Some(v) => write!(f, "{} {} close={:.2} vol={v}", self.date, self.symbol, self.close_price),
            None => write!(f, "{} {} close={:.2} vol=-", self.date, self.symbol, self.close_price),
        }
    }
}

/// Daily weather aggregates for a named location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherMetricRecord {
    pub date: NaiveDate,
    pub location: String,
    /// Mean 2m air temperature (°C).
    pub temp_mean: f64,
    /// Total precipitation (mm).
    pub precip_mm: f64,
}

impl WeatherMetricRecord {
    /// Column names in output order.
    pub const COLUMNS: &'static [&'static str] = &["date", "location", "temp_mean", "precip_mm"];
}

impl fmt::Display for WeatherMetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {:.1}°C, {:.1}mm",
            self.date, self.location, self.temp_mean, self.precip_mm
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced by the fetchers.
///
/// An empty upstream result is not an error; it comes back as an empty
/// `Vec`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("{provider} transport error: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} returned HTTP {status}: {body}")]
    Status { provider: String, status: u16, body: String },

    #[error("{provider} returned a malformed payload: {message}")]
    MalformedPayload { provider: String, message: String },

    #[error("{provider} payload is missing field `{field}`")]
    MissingField { provider: String, field: String },

    #[error("{provider} reported an error ({code}): {description}")]
    Provider { provider: String, code: String, description: String },
}

impl FetchError {
    pub fn transport(provider: &str, message: impl Into<String>) -> Self {
        Self::Transport { provider: provider.to_string(), message: message.into() }
    }

    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedPayload { provider: provider.to_string(), message: message.into() }
    }

    pub fn missing_field(provider: &str, field: impl Into<String>) -> Self {
        Self::MissingField { provider: provider.to_string(), field: field.into() }
    }

    /// Network, timeout or non-2xx failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }

    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::MalformedPayload { provider, .. }
            | Self::MissingField { provider, .. }
            | Self::Provider { provider, .. } => provider,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
