//! Weather data provider.
//!
//! Uses the free Open-Meteo forecast API (no key required) to read the
//! current day's mean temperature and total precipitation for a
//! coordinate pair.
//!
//! API: `https://api.open-meteo.com/v1/forecast`
//! Auth: None required.
//! Rate limit: Generous (free tier).

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::http::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::config::WeatherConfig;
use crate::observe::{FetchEvent, FetchObserver, TracingObserver};
use crate::types::{FetchError, WeatherMetricRecord};

pub const OPEN_METEO: &str = "open-meteo";

const DAILY_METRICS: &str = "temperature_2m_mean,precipitation_sum";
const FORECAST_DAYS: u32 = 1;

// ---------------------------------------------------------------------------
// Open-Meteo response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    #[serde(default)]
    daily: Option<OpenMeteoDaily>,
}

/// Parallel arrays, one entry per day. Each is optional so a missing
/// metric can be reported by name instead of as a parse error.
#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    #[serde(default)]
    time: Option<Vec<String>>,
    #[serde(default)]
    temperature_2m_mean: Option<Vec<Option<f64>>>,
    #[serde(default)]
    precipitation_sum: Option<Vec<Option<f64>>>,
}

/// `daily` after every expected column has been checked.
#[derive(Debug, PartialEq)]
struct DailySeries {
    dates: Vec<NaiveDate>,
    temp_mean: Vec<f64>,
    precip_mm: Vec<f64>,
}

impl OpenMeteoDaily {
    fn validate(self) -> Result<DailySeries, FetchError> {
        let time = self
            .time
            .ok_or_else(|| FetchError::missing_field(OPEN_METEO, "daily.time"))?;
        let temp = self
            .temperature_2m_mean
            .ok_or_else(|| FetchError::missing_field(OPEN_METEO, "daily.temperature_2m_mean"))?;
        let precip = self
            .precipitation_sum
            .ok_or_else(|| FetchError::missing_field(OPEN_METEO, "daily.precipitation_sum"))?;

        if temp.len() != time.len() || precip.len() != time.len() {
            return Err(FetchError::malformed(
                OPEN_METEO,
                format!(
                    "daily arrays differ in length: time={}, temperature_2m_mean={}, precipitation_sum={}",
                    time.len(),
                    temp.len(),
                    precip.len()
                ),
            ));
        }

        let dates = time
            .iter()
            .map(String::as_str)
            .map(parse_day)
            .collect::<Result<Vec<_>, _>>()?;
        let temp_mean = non_null("temperature_2m_mean", temp, &dates)?;
        let precip_mm = non_null("precipitation_sum", precip, &dates)?;

        Ok(DailySeries { dates, temp_mean, precip_mm })
    }
}

/// Open-Meteo emits `YYYY-MM-DD` for daily data and `YYYY-MM-DDTHH:MM`
/// for hourly; accept both and keep the date.
fn parse_day(raw: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").map(|dt| dt.date()))
        .map_err(|_| FetchError::malformed(OPEN_METEO, format!("unrecognised date `{raw}`")))
}

fn non_null(field: &str, values: Vec<Option<f64>>, dates: &[NaiveDate]) -> Result<Vec<f64>, FetchError> {
    values
        .into_iter()
        .zip(dates)
        .map(|(v, date)| {
            v.ok_or_else(|| FetchError::malformed(OPEN_METEO, format!("null {field} for {date}")))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

pub struct WeatherMetricFetcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
    observer: Arc<dyn FetchObserver>,
}

impl WeatherMetricFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            timeout,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(OPEN_METEO, config.timeout(), &config.user_agent)?;
        Ok(Self::new(Arc::new(transport), &config.base_url, config.timeout()))
    }

    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn build_request(&self, lat: f64, lon: f64) -> HttpRequest {
        HttpRequest::get(&self.base_url)
            .with_query("latitude", lat)
            .with_query("longitude", lon)
            .with_query("daily", DAILY_METRICS)
            .with_query("timezone", "auto")
            .with_query("forecast_days", FORECAST_DAYS)
            .with_timeout(self.timeout)
    }

    /// Today's mean temperature and precipitation at `(lat, lon)`,
    /// labelled with `location_name`.
    ///
    /// A response with no `daily` object is an empty result. A `daily`
    /// object missing one of the metrics is an error.
    pub async fn fetch_daily_metrics(
        &self,
        location_name: &str,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<WeatherMetricRecord>, FetchError> {
        self.observer.record(&FetchEvent::Started {
            provider: OPEN_METEO.to_string(),
            subject: location_name.to_string(),
            detail: format!("({lat}, {lon})"),
        });

        match self.fetch_series(lat, lon).await {
            Ok(Some(series)) if !series.dates.is_empty() => {
                let records = Self::to_records(location_name, series);
                self.observer.record(&FetchEvent::Completed {
                    provider: OPEN_METEO.to_string(),
                    subject: location_name.to_string(),
                    rows: records.len(),
                });
                Ok(records)
            }
            Ok(_) => {
                self.observer.record(&FetchEvent::Empty {
                    provider: OPEN_METEO.to_string(),
                    subject: location_name.to_string(),
                });
                Ok(Vec::new())
            }
            Err(e) => {
                self.observer.record(&FetchEvent::Failed {
                    provider: OPEN_METEO.to_string(),
                    subject: location_name.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// `None` when the response carries no `daily` object.
    async fn fetch_series(&self, lat: f64, lon: f64) -> Result<Option<DailySeries>, FetchError> {
        let resp = self
            .transport
            .get(self.build_request(lat, lon))
            .await?
            .error_for_status(OPEN_METEO)?;

        let data: OpenMeteoResponse = serde_json::from_str(&resp.body).map_err(|e| {
            FetchError::malformed(OPEN_METEO, format!("failed to parse forecast: {e}"))
        })?;

        data.daily.map(OpenMeteoDaily::validate).transpose()
    }

    fn to_records(location_name: &str, series: DailySeries) -> Vec<WeatherMetricRecord> {
        series
            .dates
            .into_iter()
            .zip(series.temp_mean)
            .zip(series.precip_mm)
            .map(|((date, temp_mean), precip_mm)| WeatherMetricRecord {
                date,
                location: location_name.to_string(),
                temp_mean,
                precip_mm,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
