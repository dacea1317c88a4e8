//! Fetch lifecycle events.
//!
//! Fetchers report progress through a `FetchObserver` instead of calling
//! the logging macros directly, so callers can route or capture events.
//! `TracingObserver` is the default and emits structured `tracing`
//! events; `RecordingObserver` keeps them in memory.

use std::sync::Mutex;
use tracing::{error, info, warn};

/// One step in the life of a single fetch call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    /// Request about to go out. `detail` describes the query window.
    Started { provider: String, subject: String, detail: String },
    /// Upstream answered with at least one row.
    Completed { provider: String, subject: String, rows: usize },
    /// Upstream answered but had nothing for the query.
    Empty { provider: String, subject: String },
    /// The call is about to return this error to the caller.
    Failed { provider: String, subject: String, error: String },
}

impl FetchEvent {
    pub fn level(&self) -> tracing::Level {
        match self {
            Self::Started { .. } | Self::Completed { .. } => tracing::Level::INFO,
            Self::Empty { .. } => tracing::Level::WARN,
            Self::Failed { .. } => tracing::Level::ERROR,
        }
    }
}

pub trait FetchObserver: Send + Sync {
    fn record(&self, event: &FetchEvent);
}

/// Forwards events to the active `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn record(&self, event: &FetchEvent) {
        match event {
            FetchEvent::Started { provider, subject, detail } => {
                info!(provider = %provider, subject = %subject, detail = %detail, "Fetching daily data");
            }
            FetchEvent::Completed { provider, subject, rows } => {
                info!(provider = %provider, subject = %subject, rows, "Extracted daily records");
            }
            FetchEvent::Empty { provider, subject } => {
                warn!(provider = %provider, subject = %subject, "No data returned");
            }
            FetchEvent::Failed { provider, subject, error } => {
                error!(provider = %provider, subject = %subject, error = %error, "Fetch failed");
            }
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FetchEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Levels of the recorded events, in order.
    pub fn levels(&self) -> Vec<tracing::Level> {
        self.events().iter().map(FetchEvent::level).collect()
    }
}

impl FetchObserver for RecordingObserver {
    fn record(&self, event: &FetchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
