//! Upstream data providers.
//!
//! One fetcher per provider. Each performs a single request, validates
//! the response into typed structures and maps it onto the record
//! shapes in `crate::types`.

pub mod commodities;
pub mod http;
pub mod weather;

pub use commodities::{CommodityPriceFetcher, PriceBar, PriceHistory, PriceHistorySource, YahooChartSource};
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use weather::WeatherMetricFetcher;
