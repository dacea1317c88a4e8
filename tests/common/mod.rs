//! Mock transport for integration testing.
//!
//! Serves canned bodies and records every request, all in-memory with
//! no network access.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use agrofeed::data::{HttpRequest, HttpResponse, HttpTransport};
use agrofeed::FetchError;

/// A deterministic `HttpTransport`.
#[derive(Clone)]
pub struct MockTransport {
    response: Arc<Mutex<HttpResponse>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    /// If set, every call fails with this error.
    force_error: Arc<Mutex<Option<FetchError>>>,
}

impl MockTransport {
    /// Answer every request with HTTP 200 and `body`.
    pub fn ok(body: &str) -> Self {
        Self::with_response(HttpResponse::ok(body))
    }

    pub fn with_response(response: HttpResponse) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            requests: Arc::new(Mutex::new(Vec::new())),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent calls to fail.
    pub fn set_error(&self, err: FetchError) {
        *self.force_error.lock().unwrap() = Some(err);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(request);
        if let Some(err) = self.force_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

/// Yahoo chart body for ZS=F with the given `(unix_ts, close, volume)` rows,
/// quoted from an exchange at UTC-6.
pub fn yahoo_chart(rows: &[(i64, Option<f64>, Option<i64>)]) -> String {
    let ts: Vec<i64> = rows.iter().map(|r| r.0).collect();
    let close: Vec<Option<f64>> = rows.iter().map(|r| r.1).collect();
    let volume: Vec<Option<i64>> = rows.iter().map(|r| r.2).collect();
    let open: Vec<Option<f64>> = close.iter().map(|c| c.map(|v| v - 5.0)).collect();

    serde_json::json!({
        "chart": {
            "result": [{
                "meta": {"symbol": "ZS=F", "exchangeTimezoneName": "America/Chicago", "gmtoffset": -21600},
                "timestamp": ts,
                "indicators": {"quote": [{
                    "open": open,
                    "high": close,
                    "low": close,
                    "close": close,
                    "volume": volume
                }]}
            }],
            "error": null
        }
    })
    .to_string()
}
