//! Structured logging setup.
//!
//! `RUST_LOG` overrides the default filter. Set `AGROFEED_LOG_JSON` for
//! JSON lines instead of the human-readable format.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_FILTER: &str = "agrofeed=info";
pub const JSON_ENV: &str = "AGROFEED_LOG_JSON";

/// Filter from `RUST_LOG`, falling back to `default_filter`.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter = env_filter(default_filter);

    let installed = if std::env::var(JSON_ENV).is_ok() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
