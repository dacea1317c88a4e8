//! HTTP transport used by the data providers.
//!
//! Providers build an `HttpRequest` and hand it to an `HttpTransport`.
//! Production code uses `ReqwestTransport`; tests swap in a mock.

use async_trait::async_trait;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::types::FetchError;

/// A GET request with query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// First value for a query parameter.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `FetchError::Status`.
    pub fn error_for_status(self, provider: &str) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::Status {
                provider: provider.to_string(),
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Executes one outbound request. Errors are connection-level only;
/// HTTP status handling is left to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// `HttpTransport` over a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    provider: String,
}

impl ReqwestTransport {
    pub fn new(provider: &str, timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                FetchError::transport(provider, format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http, provider: provider.to_string() })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        debug!(provider = %self.provider, url = %request.url, "Sending request");

        let mut builder = self.http.get(&request.url).query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("request timed out: {e}")
            } else if e.is_connect() {
                format!("connection failed: {e}")
            } else {
                format!("request failed: {e}")
            };
            FetchError::transport(&self.provider, message)
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            FetchError::transport(&self.provider, format!("failed to read response body: {e}"))
        })?;

        Ok(HttpResponse { status, body })
    }
}
