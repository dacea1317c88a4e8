//! End-to-end weather fetches against a mock Open-Meteo transport.

mod common;

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use agrofeed::config::WeatherConfig;
use agrofeed::data::HttpResponse;
use agrofeed::observe::{FetchEvent, RecordingObserver};
use agrofeed::{FetchError, WeatherMetricFetcher, WeatherMetricRecord};
use common::MockTransport;

const MATO_GROSSO: &str = r#"{
    "daily": {
        "time": ["2026-02-11"],
        "temperature_2m_mean": [28.5],
        "precipitation_sum": [12.4]
    }
}"#;

fn fetcher(transport: &MockTransport, obs: &Arc<RecordingObserver>) -> WeatherMetricFetcher {
    let cfg = WeatherConfig::default();
    WeatherMetricFetcher::new(Arc::new(transport.clone()), &cfg.base_url, cfg.timeout())
        .with_observer(obs.clone())
}

#[tokio::test]
async fn mato_grosso_single_day() {
    let transport = MockTransport::ok(MATO_GROSSO);
    let obs = Arc::new(RecordingObserver::new());

    let records = fetcher(&transport, &obs)
        .fetch_daily_metrics("Mato Grosso", -12.5, -55.5)
        .await
        .unwrap();

    assert_eq!(
        records,
        vec![WeatherMetricRecord {
            date: NaiveDate::from_ymd_opt(2026, 2, 11).unwrap(),
            location: "Mato Grosso".into(),
            temp_mean: 28.5,
            precip_mm: 12.4,
        }]
    );
    assert_eq!(obs.levels(), vec![Level::INFO, Level::INFO]);

    let req = &transport.requests()[0];
    assert_eq!(req.url, "https://api.open-meteo.com/v1/forecast");
    assert_eq!(req.query_value("forecast_days"), Some("1"));
    assert_eq!(req.timeout, Some(Duration::from_secs(10)));
}

#[tokio::test]
async fn multi_day_response_keeps_alignment() {
    let body = r#"{"daily": {
        "time": ["2026-02-11", "2026-02-12", "2026-02-13"],
        "temperature_2m_mean": [28.5, 27.1, 26.0],
        "precipitation_sum": [12.4, 0.0, 3.3]
    }}"#;
    let transport = MockTransport::ok(body);
    let obs = Arc::new(RecordingObserver::new());

    let records = fetcher(&transport, &obs)
        .fetch_daily_metrics("Paraná", -24.0, -51.0)
        .await
        .unwrap();

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.location == "Paraná"));
    assert_eq!(records[2].date, NaiveDate::from_ymd_opt(2026, 2, 13).unwrap());
    assert_eq!(records[2].temp_mean, 26.0);
    assert_eq!(records[2].precip_mm, 3.3);
}

#[tokio::test]
async fn no_daily_object_is_empty() {
    let transport = MockTransport::ok(r#"{"latitude": -12.5, "longitude": -55.5}"#);
    let obs = Arc::new(RecordingObserver::new());

    let records = fetcher(&transport, &obs)
        .fetch_daily_metrics("Mato Grosso", -12.5, -55.5)
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(obs.levels(), vec![Level::INFO, Level::WARN]);
}

#[tokio::test]
async fn empty_daily_arrays_are_empty() {
    let body = r#"{"daily": {"time": [], "temperature_2m_mean": [], "precipitation_sum": []}}"#;
    let transport = MockTransport::ok(body);
    let obs = Arc::new(RecordingObserver::new());

    let records = fetcher(&transport, &obs)
        .fetch_daily_metrics("Mato Grosso", -12.5, -55.5)
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(obs.levels(), vec![Level::INFO, Level::WARN]);
    assert_eq!(
        obs.events().last(),
        Some(&FetchEvent::Empty { provider: "open-meteo".into(), subject: "Mato Grosso".into() })
    );
}

#[tokio::test]
async fn missing_temperature_is_a_missing_field_failure() {
    let transport = MockTransport::ok(r#"{"daily": {"time": ["2026-02-11"], "precipitation_sum": [12.4]}}"#);
    let obs = Arc::new(RecordingObserver::new());

    let err = fetcher(&transport, &obs)
        .fetch_daily_metrics("Mato Grosso", -12.5, -55.5)
        .await
        .unwrap_err();

    match err {
        FetchError::MissingField { field, .. } => assert_eq!(field, "daily.temperature_2m_mean"),
        other => panic!("expected MissingField, got {other:?}"),
    }
    assert_eq!(obs.levels(), vec![Level::INFO, Level::ERROR]);
}

#[tokio::test]
async fn non_success_status_is_transport_failure() {
    let transport = MockTransport::with_response(HttpResponse { status: 503, body: String::new() });
    let obs = Arc::new(RecordingObserver::new());

    let err = fetcher(&transport, &obs)
        .fetch_daily_metrics("Mato Grosso", -12.5, -55.5)
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert_eq!(obs.levels(), vec![Level::INFO, Level::ERROR]);
}

#[tokio::test]
async fn out_of_range_coordinates_are_passed_through() {
    let transport = MockTransport::ok("{}");
    let obs = Arc::new(RecordingObserver::new());

    fetcher(&transport, &obs)
        .fetch_daily_metrics("Nowhere", 200.0, -400.0)
        .await
        .unwrap();

    let req = &transport.requests()[0];
    assert_eq!(req.query_value("latitude"), Some("200"));
    assert_eq!(req.query_value("longitude"), Some("-400"));
}

#[tokio::test]
async fn repeated_fetch_is_identical() {
    let transport = MockTransport::ok(MATO_GROSSO);
    let obs = Arc::new(RecordingObserver::new());
    let fetcher = fetcher(&transport, &obs);

    let first = fetcher.fetch_daily_metrics("Mato Grosso", -12.5, -55.5).await.unwrap();
    let second = fetcher.fetch_daily_metrics("Mato Grosso", -12.5, -55.5).await.unwrap();

    assert_eq!(first, second);
}
