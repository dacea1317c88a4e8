//! AGROFEED: daily commodity futures prices and weather metrics.
//!
//! Two fetchers (`data::commodities`, `data::weather`) each make one
//! upstream request and return records shaped for the tables declared
//! in `storage`.

pub mod clock;
pub mod config;
pub mod data;
pub mod observe;
pub mod storage;
pub mod telemetry;
pub mod types;

pub use data::{CommodityPriceFetcher, WeatherMetricFetcher};
pub use types::{CommodityPriceRecord, FetchError, WeatherMetricRecord};
