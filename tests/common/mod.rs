//! Common test utilities
//!
//! Provides shared initialization code for the integration tests, including
//! rustls crypto provider setup.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use infra_deployer::config::DeploymentConfig;
use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Must run before any HTTP client is built. Uses a `Once` so it is only
/// installed once per test binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        infra_deployer::runtime::install_crypto_provider();
    });
}

/// Configuration of the `shop`/`dev` stack used throughout the tests
pub fn shop_dev_config() -> DeploymentConfig {
    DeploymentConfig {
        project_name: "shop".to_string(),
        environment: "dev".to_string(),
        ..DeploymentConfig::default()
    }
}
