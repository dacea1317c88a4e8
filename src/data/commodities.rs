//! Commodity futures price provider.
//!
//! Pulls daily history from the Yahoo Finance chart endpoint and
//! reshapes it into `CommodityPriceRecord`s (date, close, volume,
//! symbol). Open/high/low are decoded but never leave this module.
//!
//! API: `https://query1.finance.yahoo.com/v8/finance/chart/{symbol}`
//! Auth: none for the chart endpoint.
//! Window: `[period1, period2)` at exchange-local midnight, so the end
//! date is exclusive.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::http::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::clock::{Clock, SystemClock};
use crate::config::{CommodityConfig, DEFAULT_EXCHANGE_TIMEZONE};
use crate::observe::{FetchEvent, FetchObserver, TracingObserver};
use crate::types::{CommodityPriceRecord, FetchError};

pub const YAHOO: &str = "yahoo";

// ---------------------------------------------------------------------------
// Provider-neutral history table
// ---------------------------------------------------------------------------

/// One daily bar as the provider reported it, in exchange-local time.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<i64>,
}

/// Daily bars for one symbol, in provider order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceHistory {
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// A historical daily price query against some market-data provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    /// Provider name used in logs and errors.
    fn name(&self) -> String;

    /// Daily bars for `symbol` in `[start, end)`.
    async fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, FetchError>;
}

// ---------------------------------------------------------------------------
// Yahoo chart response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<YahooIndicators>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooChartMeta {
    /// IANA zone of the exchange, e.g. `America/Chicago`.
    #[serde(default)]
    exchange_timezone_name: Option<String>,
    /// Exchange offset from UTC in seconds at request time.
    #[serde(default)]
    gmtoffset: i64,
}

impl YahooChartMeta {
    /// Exchange-local wall time of a bar. The named zone handles DST per
    /// bar; `gmtoffset` is only a fallback.
    fn local_time(&self, utc: DateTime<chrono::Utc>) -> NaiveDateTime {
        match self.exchange_timezone_name.as_deref().and_then(|n| n.parse::<Tz>().ok()) {
            Some(tz) => utc.with_timezone(&tz).naive_local(),
            None => utc.naive_utc() + Duration::seconds(self.gmtoffset),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    open: Option<Vec<Option<f64>>>,
    #[serde(default)]
    high: Option<Vec<Option<f64>>>,
    #[serde(default)]
    low: Option<Vec<Option<f64>>>,
    #[serde(default)]
    close: Option<Vec<Option<f64>>>,
    #[serde(default)]
    volume: Option<Vec<Option<i64>>>,
}

// ---------------------------------------------------------------------------
// Yahoo source
// ---------------------------------------------------------------------------

pub struct YahooChartSource {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: std::time::Duration,
    exchange_tz: Tz,
}

impl YahooChartSource {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, timeout: std::time::Duration) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            exchange_tz: DEFAULT_EXCHANGE_TIMEZONE,
        }
    }

    /// Zone whose midnights bound the query window.
    pub fn with_exchange_tz(mut self, tz: Tz) -> Self {
        self.exchange_tz = tz;
        self
    }

    pub fn from_config(config: &CommodityConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::new(YAHOO, config.timeout(), &config.user_agent)?;
        Ok(Self::new(Arc::new(transport), &config.base_url, config.timeout())
            .with_exchange_tz(config.exchange_timezone))
    }

    fn build_request(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> HttpRequest {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(symbol)
        );
        HttpRequest::get(url)
            .with_query("period1", local_midnight(start, self.exchange_tz))
            .with_query("period2", local_midnight(end, self.exchange_tz))
            .with_query("interval", "1d")
            .with_query("includePrePost", "false")
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout(self.timeout)
    }

    /// Decode a chart body into bars. Bars without a close are skipped.
    fn parse_chart(body: &str) -> Result<PriceHistory, FetchError> {
        let resp: YahooChartResponse = serde_json::from_str(body)
            .map_err(|e| FetchError::malformed(YAHOO, format!("failed to parse chart: {e}")))?;

        if let Some(err) = resp.chart.error {
            return Err(FetchError::Provider {
                provider: YAHOO.to_string(),
                code: err.code,
                description: err.description,
            });
        }

        let Some(result) = resp.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(PriceHistory::default());
        };
        let Some(timestamps) = result.timestamp else {
            return Ok(PriceHistory::default());
        };

        let quote = result
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .ok_or_else(|| FetchError::missing_field(YAHOO, "indicators.quote"))?;
        let close = quote
            .close
            .ok_or_else(|| FetchError::missing_field(YAHOO, "indicators.quote.close"))?;

        let n = timestamps.len();
        check_len("close", close.len(), n)?;
        let open = aligned("open", quote.open, n)?;
        let high = aligned("high", quote.high, n)?;
        let low = aligned("low", quote.low, n)?;
        let volume = aligned("volume", quote.volume, n)?;

        let meta = result.meta.unwrap_or_default();

        let mut bars = Vec::with_capacity(n);
        for (i, &ts) in timestamps.iter().enumerate() {
            let Some(price) = close[i] else { continue };
            let utc = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| FetchError::malformed(YAHOO, format!("invalid timestamp {ts}")))?;
            bars.push(PriceBar {
                timestamp: meta.local_time(utc),
                open: open[i],
                high: high[i],
                low: low[i],
                close: price,
                volume: volume[i],
            });
        }

        Ok(PriceHistory { bars })
    }
}

/// Unix seconds of `date` 00:00 in `tz`. A midnight skipped by DST
/// resolves to the first instant after the gap.
fn local_midnight(date: NaiveDate, tz: Tz) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map(|t| t.timestamp())
        .unwrap_or_else(|| midnight.and_utc().timestamp())
}

fn check_len(field: &str, len: usize, expected: usize) -> Result<(), FetchError> {
    if len == expected {
        Ok(())
    } else {
        Err(FetchError::malformed(
            YAHOO,
            format!("{field} has {len} values for {expected} timestamps"),
        ))
    }
}

/// An optional column, padded with nulls when absent.
fn aligned<T: Copy>(
    field: &str,
    column: Option<Vec<Option<T>>>,
    n: usize,
) -> Result<Vec<Option<T>>, FetchError> {
    match column {
        Some(values) => {
            check_len(field, values.len(), n)?;
            Ok(values)
        }
        None => Ok(vec![None; n]),
    }
}

#[async_trait]
impl PriceHistorySource for YahooChartSource {
    fn name(&self) -> String {
        YAHOO.to_string()
    }

    async fn daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, FetchError> {
        let request = self.build_request(symbol, start, end);
        let resp = self.transport.get(request).await?.error_for_status(YAHOO)?;
        Self::parse_chart(&resp.body)
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

pub struct CommodityPriceFetcher {
    source: Arc<dyn PriceHistorySource>,
    observer: Arc<dyn FetchObserver>,
    clock: Arc<dyn Clock>,
}

impl CommodityPriceFetcher {
    pub fn new(source: Arc<dyn PriceHistorySource>) -> Self {
        Self {
            source,
            observer: Arc::new(TracingObserver),
            clock: Arc::new(SystemClock),
        }
    }

    /// Yahoo-backed fetcher with the wall clock and `tracing` logging.
    pub fn from_config(config: &CommodityConfig) -> Result<Self, FetchError> {
        Ok(Self::new(Arc::new(YahooChartSource::from_config(config)?)))
    }

    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Daily close/volume for `symbol` over `[start_date, end_date)`.
    ///
    /// `end_date` defaults to today. The range is passed through
    /// unchecked. An empty upstream result returns an empty `Vec`; any
    /// upstream failure is returned unchanged.
    pub async fn fetch_daily_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<CommodityPriceRecord>, FetchError> {
        let end_date = end_date.unwrap_or_else(|| self.clock.today());
        let provider = self.source.name();

        self.observer.record(&FetchEvent::Started {
            provider: provider.clone(),
            subject: symbol.to_string(),
            detail: format!("{start_date} to {end_date}"),
        });

        let history = match self.source.daily_history(symbol, start_date, end_date).await {
            Ok(h) => h,
            Err(e) => {
                self.observer.record(&FetchEvent::Failed {
                    provider,
                    subject: symbol.to_string(),
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        if history.is_empty() {
            self.observer.record(&FetchEvent::Empty { provider, subject: symbol.to_string() });
            return Ok(Vec::new());
        }

        let records = Self::to_records(symbol, history);

        self.observer.record(&FetchEvent::Completed {
            provider,
            subject: symbol.to_string(),
            rows: records.len(),
        });
        Ok(records)
    }

    /// Keep close and volume, one row per calendar date (last bar wins),
    /// sorted by date.
    fn to_records(symbol: &str, history: PriceHistory) -> Vec<CommodityPriceRecord> {
        let by_date: BTreeMap<NaiveDate, PriceBar> = history
            .bars
            .into_iter()
            .map(|bar| (bar.timestamp.date(), bar))
            .collect();

        by_date
            .into_iter()
            .map(|(date, bar)| CommodityPriceRecord {
                date,
                close_price: bar.close,
                volume: bar.volume,
                symbol: symbol.to_string(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
