//! # Program
//!
//! Declares the whole topology on a stack:
//!
//! 1. Resource group
//! 2. Storage account and its connection string
//! 3. Application Insights component
//! 4. Linux App Service plan
//! 5. Cosmos DB account, its master keys, the application database and the
//!    `users` container
//! 6. Web application wired to telemetry and the database
//! 7. Functions application wired to telemetry and host storage
//!
//! Declaration never waits on the cloud. Every cross-resource value is an
//! [`Output`] and realization order follows from those data dependencies.

pub mod settings;

use crate::config::DeploymentConfig;
use crate::connection_string::get_connection_string;
use crate::constants::NODE_VERSION;
use crate::error::DeployError;
use crate::output::Output;
use crate::resource::documentdb::{
    list_database_account_keys, CreateUpdateOptions, DatabaseAccount, DatabaseAccountArgs,
    SqlContainer, SqlContainerArgs, SqlContainerResource, SqlDatabase, SqlDatabaseArgs,
};
use crate::resource::insights::{Component, ComponentArgs};
use crate::resource::resource_group::{ResourceGroup, ResourceGroupArgs};
use crate::resource::storage::{StorageAccount, StorageAccountArgs};
use crate::resource::web::{AppServicePlan, AppServicePlanArgs, SiteConfig, SkuDescription, WebApp, WebAppArgs};
use crate::stack::{OutputValue, Stack};
use settings::{function_app_settings, web_app_settings, WebAppSettingsInputs};
use std::collections::BTreeMap;
use tracing::info;

pub const APP_INSIGHT_INSTRUMENTATION_KEY: &str = "appInsightInstrumentationKey";
pub const WEB_APP_NAME: &str = "webAppName";
pub const FUNCTIONS_APP_NAME: &str = "functionsAppName";

/// Values exported by the stack for downstream tooling
#[derive(Debug, Clone)]
pub struct StackOutputs {
    pub app_insight_instrumentation_key: Output<String>,
    pub web_app_name: Output<String>,
    pub functions_app_name: Output<String>,
}

impl StackOutputs {
    /// Wait for every export
    ///
    /// # Errors
    /// Returns the failure of the first export that cannot be resolved
    pub async fn resolve(&self) -> Result<BTreeMap<String, OutputValue>, DeployError> {
        let exports = [
            (APP_INSIGHT_INSTRUMENTATION_KEY, &self.app_insight_instrumentation_key),
            (WEB_APP_NAME, &self.web_app_name),
            (FUNCTIONS_APP_NAME, &self.functions_app_name),
        ];

        let mut resolved = BTreeMap::new();
        for (name, output) in exports {
            let value = output.resolve().await?;
            let value = if output.is_secret() {
                OutputValue::secret(value)
            } else {
                OutputValue::plain(value)
            };
            resolved.insert(name.to_string(), value);
        }
        Ok(resolved)
    }
}

/// Register every resource of the topology with `stack`
///
/// # Errors
/// Returns `DuplicateResource` if the stack already holds one of the resources
pub fn deploy(stack: &Stack, config: &DeploymentConfig) -> Result<StackOutputs, DeployError> {
    let names = config.resource_names();
    info!(
        project = %config.project_name,
        environment = %config.environment,
        location = %config.location,
        "Declaring topology"
    );

    let resource_group = ResourceGroup::new(
        stack,
        &names.resource_group(),
        ResourceGroupArgs::new(names.resource_group(), &config.location),
    )?;
    let resource_group_name = resource_group.name();
    let location = resource_group.location();

    let storage_account = StorageAccount::new(
        stack,
        &names.storage_account(),
        StorageAccountArgs::new(
            names.storage_account(),
            resource_group_name.clone(),
            location.clone(),
        ),
    )?;
    let storage_connection_string =
        get_connection_string(stack, &resource_group_name, &storage_account.name());

    let app_insights = Component::new(
        stack,
        &names.app_insights(),
        ComponentArgs::web(names.app_insights(), resource_group_name.clone(), location.clone()),
    )?;

    let app_service_plan = AppServicePlan::new(
        stack,
        &names.app_service_plan(),
        AppServicePlanArgs::linux(
            names.app_service_plan(),
            resource_group_name.clone(),
            location.clone(),
            SkuDescription {
                name: config.web_sku_name.clone(),
                tier: config.web_sku_tier.clone(),
            },
        ),
    )?;

    let cosmos_account = DatabaseAccount::new(
        stack,
        &names.cosmos_account(),
        DatabaseAccountArgs::single_region(
            names.cosmos_account(),
            resource_group_name.clone(),
            location.clone(),
        ),
    )?;
    let account_keys = list_database_account_keys(stack, &resource_group_name, &cosmos_account.name());

    let database = SqlDatabase::new(
        stack,
        &names.database(),
        SqlDatabaseArgs {
            database_name: names.database(),
            resource_group_name: resource_group_name.clone(),
            account_name: cosmos_account.name(),
            options: CreateUpdateOptions {
                throughput: Some(config.database_throughput),
            },
        },
    )?;

    let users_container = SqlContainer::new(
        stack,
        &names.users_container(),
        SqlContainerArgs {
            container_name: names.users_container(),
            resource_group_name: resource_group_name.clone(),
            account_name: cosmos_account.name(),
            database_name: database.name(),
            resource: SqlContainerResource::new(names.users_container()),
        },
    )?;

    let web_app_name = names.web_app();
    let web_app = WebApp::new(
        stack,
        &web_app_name,
        WebAppArgs {
            name: web_app_name.clone(),
            resource_group_name: resource_group_name.clone(),
            location: location.clone(),
            server_farm_id: app_service_plan.id(),
            kind: None,
            site_config: SiteConfig {
                app_settings: web_app_settings(WebAppSettingsInputs {
                    instrumentation_key: app_insights.instrumentation_key(),
                    role_name: web_app_name.clone(),
                    cosmos_endpoint: cosmos_account.document_endpoint(),
                    cosmos_primary_key: account_keys.apply(|keys| keys.primary_master_key.clone()),
                    database_name: database.name(),
                    users_container_name: users_container.name(),
                }),
                ..SiteConfig::default()
            },
        },
    )?;

    let function_app_name = names.function_app();
    let function_app = WebApp::new(
        stack,
        &function_app_name,
        WebAppArgs {
            name: function_app_name.clone(),
            resource_group_name,
            location,
            server_farm_id: app_service_plan.id(),
            kind: Some("functionapp".to_string()),
            site_config: SiteConfig {
                app_settings: function_app_settings(
                    storage_connection_string,
                    &app_insights.instrumentation_key(),
                    &function_app_name,
                ),
                http20_enabled: Some(true),
                node_version: Some(NODE_VERSION.to_string()),
            },
        },
    )?;

    Ok(StackOutputs {
        app_insight_instrumentation_key: app_insights.instrumentation_key(),
        web_app_name: web_app.name(),
        functions_app_name: function_app.name(),
    })
}
