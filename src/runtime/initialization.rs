//! # Initialization
//!
//! Process start-up: rustls setup, `.env` loading, configuration layering and
//! tracing.

use crate::cli::Cli;
use crate::config::DeploymentConfig;
use crate::observability::init_tracing;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Install ring as the process-wide rustls crypto provider
///
/// Must run before any TLS client is built. A provider installed earlier
/// (e.g. by a test harness) is kept.
pub fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

/// Prepare the process and build the effective configuration
///
/// # Errors
/// Returns an error if `.env` or the configuration file cannot be read, or
/// tracing cannot be installed
pub fn initialize(cli: &Cli) -> Result<DeploymentConfig> {
    install_crypto_provider();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to load .env file");
        }
    }

    let mut config = DeploymentConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    init_tracing(&config.log_level, config.log_format)?;

    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    debug!(config = ?config, "Effective configuration");

    Ok(config)
}
