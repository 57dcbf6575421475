//! # Constants
//!
//! Shared constants used throughout the deployer.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default Azure region for the resource group
pub const DEFAULT_LOCATION: &str = "eastus";

/// Default Azure Resource Manager endpoint
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";

/// Default App Service plan size
/// See `az appservice plan create --sku` for available options
pub const DEFAULT_WEB_SKU_NAME: &str = "B1";

/// Default App Service plan tier
pub const DEFAULT_WEB_SKU_TIER: &str = "Basic";

/// Default provisioned throughput (RU/s) for the SQL database
pub const DEFAULT_DATABASE_THROUGHPUT: u32 = 400;

/// Default interval between provisioning state polls (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default upper bound for a single long-running ARM operation (seconds)
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 1800;

/// Default directory for stack state files
pub const DEFAULT_STATE_DIR: &str = ".infra";

/// Subscription id reported by the in-memory provider
pub const MEMORY_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Placeholder for values that are only known after provisioning
pub const UNKNOWN_VALUE: &str = "[unknown]";

/// Placeholder printed instead of secret values
pub const SECRET_PLACEHOLDER: &str = "[secret]";

/// Name of the users container inside the application database
pub const USERS_CONTAINER_NAME: &str = "users";

/// Partition key path of every application container
pub const PARTITION_KEY_PATH: &str = "/id";

/// Application Insights agent extension version
pub const APPINSIGHTS_AGENT_EXTENSION_VERSION: &str = "~2";

/// Azure Functions host runtime version
pub const FUNCTIONS_EXTENSION_VERSION: &str = "~3";

/// Azure Functions language worker
pub const FUNCTIONS_WORKER_RUNTIME: &str = "node";

/// Node.js version used by the functions app
pub const NODE_VERSION: &str = "~14";
