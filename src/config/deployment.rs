//! # Deployment Configuration
//!
//! Identity of the stack (project and environment), target subscription,
//! sizing of the plan and database, and engine settings.

use crate::constants::{
    DEFAULT_ARM_ENDPOINT, DEFAULT_DATABASE_THROUGHPUT, DEFAULT_LOCATION,
    DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_STATE_DIR,
    DEFAULT_WEB_SKU_NAME, DEFAULT_WEB_SKU_TIER,
};
use crate::naming::ResourceNames;
use crate::stack::stack_name;
use anyhow::{bail, Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bearer token for Azure Resource Manager
///
/// Never serialized; read from `AZURE_ACCESS_TOKEN` only.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([redacted])")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("Unknown log format '{other}' (expected text or json)"),
        }
    }
}

/// Settings of one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentConfig {
    /// Project name, the first component of every resource name
    pub project_name: String,
    /// Environment (stack) name, e.g. `dev` or `prod`
    pub environment: String,
    /// Azure region of the resource group; other resources inherit it
    pub location: String,
    /// Subscription to deploy into. Required for `up` and `destroy`.
    pub subscription_id: Option<String>,
    /// App Service plan size (e.g. `B1`, `S1`, `P1v2`)
    pub web_sku_name: String,
    /// App Service plan tier (e.g. `Basic`, `Standard`)
    pub web_sku_tier: String,
    /// Provisioned throughput of the SQL database (RU/s)
    pub database_throughput: u32,
    /// Azure Resource Manager endpoint
    pub arm_endpoint: String,
    /// Interval between provisioning state polls (seconds)
    pub poll_interval_secs: u64,
    /// Upper bound for a single long-running operation (seconds)
    pub operation_timeout_secs: u64,
    /// Directory holding stack state files
    pub state_dir: PathBuf,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    pub log_format: LogFormat,
    #[serde(skip)]
    #[schemars(skip)]
    pub access_token: Option<AccessToken>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            project_name: String::new(),
            environment: "dev".to_string(),
            location: DEFAULT_LOCATION.to_string(),
            subscription_id: None,
            web_sku_name: DEFAULT_WEB_SKU_NAME.to_string(),
            web_sku_tier: DEFAULT_WEB_SKU_TIER.to_string(),
            database_throughput: DEFAULT_DATABASE_THROUGHPUT,
            arm_endpoint: DEFAULT_ARM_ENDPOINT.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            access_token: None,
        }
    }
}

impl DeploymentConfig {
    /// Defaults overlaid with the YAML file (if given) and the process environment
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Overlay values from a variable lookup (the process environment in practice)
    ///
    /// Unparseable numeric values are ignored and the previous value kept.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        override_str(&lookup, "INFRA_PROJECT", &mut self.project_name);
        override_str(&lookup, "INFRA_ENVIRONMENT", &mut self.environment);
        override_str(&lookup, "INFRA_LOCATION", &mut self.location);
        override_str(&lookup, "INFRA_WEB_SKU_NAME", &mut self.web_sku_name);
        override_str(&lookup, "INFRA_WEB_SKU_TIER", &mut self.web_sku_tier);
        override_str(&lookup, "INFRA_ARM_ENDPOINT", &mut self.arm_endpoint);
        override_str(&lookup, "LOG_LEVEL", &mut self.log_level);
        override_parsed(&lookup, "INFRA_DATABASE_THROUGHPUT", &mut self.database_throughput);
        override_parsed(&lookup, "INFRA_POLL_INTERVAL_SECS", &mut self.poll_interval_secs);
        override_parsed(&lookup, "INFRA_OPERATION_TIMEOUT_SECS", &mut self.operation_timeout_secs);
        override_parsed(&lookup, "LOG_FORMAT", &mut self.log_format);

        if let Some(dir) = lookup("INFRA_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(subscription_id) = lookup("AZURE_SUBSCRIPTION_ID") {
            self.subscription_id = Some(subscription_id);
        }
        if let Some(token) = lookup("AZURE_ACCESS_TOKEN") {
            self.access_token = Some(AccessToken::new(token));
        }
    }

    /// # Errors
    /// Returns an error if the stack identity is missing or cannot name a state file
    pub fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() {
            bail!("Project name is required (set projectName, INFRA_PROJECT or --project)");
        }
        if self.environment.is_empty() {
            bail!("Environment is required (set environment, INFRA_ENVIRONMENT or --stack)");
        }
        for (what, value) in [("Project name", &self.project_name), ("Environment", &self.environment)] {
            if value.contains(['/', '\\']) || value == "." || value == ".." {
                bail!("{what} {value:?} must not contain path separators");
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn resource_names(&self) -> ResourceNames {
        ResourceNames::new(&self.project_name, &self.environment)
    }

    #[must_use]
    pub fn stack_name(&self) -> String {
        stack_name(&self.project_name, &self.environment)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

fn override_str(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut String) {
    if let Some(value) = lookup(key) {
        *target = value;
    }
}

fn override_parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T) {
    if let Some(value) = lookup(key).and_then(|v| v.parse().ok()) {
        *target = value;
    }
}
