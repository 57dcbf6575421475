//! # Logging
//!
//! Installs the global tracing subscriber.
//!
//! `RUST_LOG` takes precedence; otherwise the crate logs at the configured
//! level and dependencies stay at `warn`.

use crate::config::LogFormat;
use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
#[must_use]
pub fn default_filter(log_level: &str) -> String {
    format!("warn,infra_deployer={}", log_level.to_lowercase())
}

/// # Errors
/// Returns an error if a global subscriber is already installed
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    // Logs go to stderr so command output on stdout stays machine-readable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
