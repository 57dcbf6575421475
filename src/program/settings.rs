//! # Application Settings
//!
//! Assembles the name/value settings of the two sites. Values that come from
//! other resources stay deferred; the site is created only after all of them
//! resolve.

use crate::constants::{
    APPINSIGHTS_AGENT_EXTENSION_VERSION, FUNCTIONS_EXTENSION_VERSION, FUNCTIONS_WORKER_RUNTIME,
    NODE_VERSION,
};
use crate::output::Output;
use crate::resource::web::NameValuePair;

pub const APPINSIGHTS_INSTRUMENTATIONKEY: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";
pub const APPLICATIONINSIGHTS_CONNECTION_STRING: &str = "APPLICATIONINSIGHTS_CONNECTION_STRING";
pub const APPLICATIONINSIGHTS_ROLENAME: &str = "APPLICATIONINSIGHTS_ROLENAME";
pub const APPINSIGHTS_AGENT_EXTENSION: &str = "ApplicationInsightsAgent_EXTENSION_VERSION";

/// Telemetry block shared by every site
///
/// The role name is the site's own name so telemetry from the two sites can
/// be told apart.
#[must_use]
pub fn telemetry_settings(instrumentation_key: &Output<String>, role_name: &str) -> Vec<NameValuePair> {
    vec![
        NameValuePair::new(APPINSIGHTS_INSTRUMENTATIONKEY, instrumentation_key.clone()),
        NameValuePair::new(
            APPLICATIONINSIGHTS_CONNECTION_STRING,
            instrumentation_key.apply(|key| format!("InstrumentationKey={key}")),
        ),
        NameValuePair::new(APPLICATIONINSIGHTS_ROLENAME, role_name),
        NameValuePair::new(APPINSIGHTS_AGENT_EXTENSION, APPINSIGHTS_AGENT_EXTENSION_VERSION),
    ]
}

/// Inputs of the web application's settings
#[derive(Debug, Clone)]
pub struct WebAppSettingsInputs {
    pub instrumentation_key: Output<String>,
    pub role_name: String,
    pub cosmos_endpoint: Output<String>,
    pub cosmos_primary_key: Output<String>,
    pub database_name: Output<String>,
    pub users_container_name: Output<String>,
}

/// Telemetry block followed by the database connection details
#[must_use]
pub fn web_app_settings(inputs: WebAppSettingsInputs) -> Vec<NameValuePair> {
    let mut settings = telemetry_settings(&inputs.instrumentation_key, &inputs.role_name);
    settings.extend([
        NameValuePair::new("COSMOSDB_ENDPOINT", inputs.cosmos_endpoint),
        NameValuePair::new("COSMOSDB_KEY", inputs.cosmos_primary_key),
        NameValuePair::new("DATABASE_NAME", inputs.database_name),
        NameValuePair::new("COSMOSDB_USERS_CONTAINER", inputs.users_container_name),
    ]);
    settings
}

/// Functions host settings followed by the telemetry block
#[must_use]
pub fn function_app_settings(
    storage_connection_string: Output<String>,
    instrumentation_key: &Output<String>,
    role_name: &str,
) -> Vec<NameValuePair> {
    let mut settings = vec![
        NameValuePair::new("AzureWebJobsStorage", storage_connection_string),
        NameValuePair::new("FUNCTIONS_EXTENSION_VERSION", FUNCTIONS_EXTENSION_VERSION),
        NameValuePair::new("FUNCTIONS_WORKER_RUNTIME", FUNCTIONS_WORKER_RUNTIME),
        NameValuePair::new("WEBSITE_NODE_DEFAULT_VERSION", NODE_VERSION),
    ];
    settings.extend(telemetry_settings(instrumentation_key, role_name));
    settings
}
