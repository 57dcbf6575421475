//! End-to-end deployment tests against the in-memory provider
//!
//! These tests run the same `up` / `destroy` commands the CLI runs, with the
//! Azure provider swapped for `MemoryProvider`.

mod common;

use common::shop_dev_config;
use infra_deployer::config::DeploymentConfig;
use infra_deployer::constants::MEMORY_SUBSCRIPTION_ID;
use infra_deployer::prelude::*;
use infra_deployer::provider::memory::MemoryOperation;
use infra_deployer::runtime::commands;
use infra_deployer::stack::{FileStateStore, MemoryStateStore};
use serde_json::Value;
use std::sync::Arc;

fn resource_id(path: &str) -> String {
    format!("/subscriptions/{MEMORY_SUBSCRIPTION_ID}/resourceGroups/shop-dev-rg{path}")
}

fn setting<'a>(site: &'a Value, name: &str) -> &'a str {
    site["properties"]["siteConfig"]["appSettings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|setting| setting["name"] == name)
        .and_then(|setting| setting["value"].as_str())
        .unwrap_or_else(|| panic!("setting {name} missing"))
}

fn position(operations: &[MemoryOperation], suffix: &str) -> usize {
    operations
        .iter()
        .position(|operation| {
            matches!(operation, MemoryOperation::CreateOrUpdate(id) if id.ends_with(suffix))
        })
        .unwrap_or_else(|| panic!("{suffix} was never created"))
}

#[tokio::test]
async fn test_up_creates_every_resource_after_its_dependencies() {
    let provider = Arc::new(MemoryProvider::new());
    let store = MemoryStateStore::new();

    let state = commands::up(provider.clone(), &store, &shop_dev_config())
        .await
        .unwrap();
    assert_eq!(state.resources.len(), 9);
    assert_eq!(provider.resource_ids().await.len(), 9);

    let operations = provider.operations().await;
    let rg = position(&operations, "/resourceGroups/shop-dev-rg");
    let storage = position(&operations, "/storageAccounts/shopdevsa");
    let insights = position(&operations, "/components/shop-dev-ai");
    let plan = position(&operations, "/serverfarms/shop-dev-asp");
    let account = position(&operations, "/databaseAccounts/shop-dev-cdb");
    let database = position(&operations, "/sqlDatabases/shop-dev-db");
    let container = position(&operations, "/containers/users");
    let web = position(&operations, "/sites/shop-dev-web");
    let func = position(&operations, "/sites/shop-dev-func");

    assert_eq!(rg, 0);
    assert!(account < database && database < container);
    for dependency in [insights, plan, account, database, container] {
        assert!(dependency < web);
    }
    for dependency in [storage, insights, plan] {
        assert!(dependency < func);
    }
}

#[tokio::test]
async fn test_web_app_settings_are_resolved_from_upstream_outputs() {
    let provider = Arc::new(MemoryProvider::new());
    let store = MemoryStateStore::new();
    commands::up(provider.clone(), &store, &shop_dev_config())
        .await
        .unwrap();

    let insights = provider
        .resource(&resource_id("/providers/Microsoft.Insights/components/shop-dev-ai"))
        .await
        .unwrap();
    let instrumentation_key = insights["properties"]["InstrumentationKey"].as_str().unwrap();
    let keys = provider
        .list_database_account_keys("shop-dev-rg", "shop-dev-cdb")
        .await
        .unwrap();

    let web = provider
        .resource(&resource_id("/providers/Microsoft.Web/sites/shop-dev-web"))
        .await
        .unwrap();
    assert!(web.get("kind").is_none());
    assert_eq!(
        web["properties"]["serverFarmId"],
        resource_id("/providers/Microsoft.Web/serverfarms/shop-dev-asp")
    );
    assert_eq!(setting(&web, "APPINSIGHTS_INSTRUMENTATIONKEY"), instrumentation_key);
    assert_eq!(
        setting(&web, "APPLICATIONINSIGHTS_CONNECTION_STRING"),
        format!("InstrumentationKey={instrumentation_key}")
    );
    assert_eq!(setting(&web, "APPLICATIONINSIGHTS_ROLENAME"), "shop-dev-web");
    assert_eq!(setting(&web, "ApplicationInsightsAgent_EXTENSION_VERSION"), "~2");
    assert_eq!(
        setting(&web, "COSMOSDB_ENDPOINT"),
        "https://shop-dev-cdb.documents.azure.com:443/"
    );
    assert_eq!(setting(&web, "COSMOSDB_KEY"), keys.primary_master_key);
    assert_eq!(setting(&web, "DATABASE_NAME"), "shop-dev-db");
    assert_eq!(setting(&web, "COSMOSDB_USERS_CONTAINER"), "users");
}

#[tokio::test]
async fn test_function_app_uses_first_storage_key() {
    let provider = Arc::new(
        MemoryProvider::new().with_storage_keys("shopdevsa", &[("key1", "k1"), ("key2", "k2")]),
    );
    let store = MemoryStateStore::new();
    commands::up(provider.clone(), &store, &shop_dev_config())
        .await
        .unwrap();

    let func = provider
        .resource(&resource_id("/providers/Microsoft.Web/sites/shop-dev-func"))
        .await
        .unwrap();
    assert_eq!(func["kind"], "functionapp");
    assert_eq!(func["properties"]["siteConfig"]["http20Enabled"], true);
    assert_eq!(func["properties"]["siteConfig"]["nodeVersion"], "~14");
    assert_eq!(
        setting(&func, "AzureWebJobsStorage"),
        "DefaultEndpointsProtocol=https;AccountName=shopdevsa;AccountKey=k1"
    );
    assert_eq!(setting(&func, "FUNCTIONS_EXTENSION_VERSION"), "~3");
    assert_eq!(setting(&func, "FUNCTIONS_WORKER_RUNTIME"), "node");
    assert_eq!(setting(&func, "WEBSITE_NODE_DEFAULT_VERSION"), "~14");
    assert_eq!(setting(&func, "APPLICATIONINSIGHTS_ROLENAME"), "shop-dev-func");
}

#[tokio::test]
async fn test_container_partition_key_and_database_throughput() {
    let provider = Arc::new(MemoryProvider::new());
    let store = MemoryStateStore::new();
    commands::up(provider.clone(), &store, &shop_dev_config())
        .await
        .unwrap();

    let account = resource_id("/providers/Microsoft.DocumentDB/databaseAccounts/shop-dev-cdb");
    let database = provider
        .resource(&format!("{account}/sqlDatabases/shop-dev-db"))
        .await
        .unwrap();
    let container = provider
        .resource(&format!("{account}/sqlDatabases/shop-dev-db/containers/users"))
        .await
        .unwrap();

    assert_eq!(database["properties"]["options"]["throughput"], 400);
    assert_eq!(
        container["properties"]["resource"]["partitionKey"],
        serde_json::json!({"kind": "Hash", "paths": ["/id"]})
    );
}

#[tokio::test]
async fn test_outputs_are_recorded_without_secret_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = DeploymentConfig {
        state_dir: dir.path().to_path_buf(),
        ..shop_dev_config()
    };
    let store = FileStateStore::new(&config.state_dir);
    let provider = Arc::new(MemoryProvider::new());

    let state = commands::up(provider, &store, &config).await.unwrap();
    let instrumentation_key = state.outputs["appInsightInstrumentationKey"]
        .value
        .clone()
        .unwrap();

    let raw = std::fs::read_to_string(store.path_for("shop/dev")).unwrap();
    assert!(!raw.contains(&instrumentation_key));

    let recorded = commands::outputs(&store, &config).await.unwrap();
    assert_eq!(recorded.len(), 3);
    assert_eq!(recorded["webAppName"].display(false), "shop-dev-web");
    assert_eq!(recorded["functionsAppName"].display(false), "shop-dev-func");
    assert_eq!(recorded["appInsightInstrumentationKey"].display(true), "[secret]");
}

#[tokio::test]
async fn test_up_twice_keeps_one_record_per_resource() {
    let provider = Arc::new(MemoryProvider::new());
    let store = MemoryStateStore::new();
    let config = shop_dev_config();

    let first = commands::up(provider.clone(), &store, &config).await.unwrap();
    let second = commands::up(provider.clone(), &store, &config).await.unwrap();

    assert_eq!(second.resources.len(), 9);
    assert_eq!(provider.resource_ids().await.len(), 9);
    assert_eq!(
        first.outputs["appInsightInstrumentationKey"],
        second.outputs["appInsightInstrumentationKey"]
    );
}

#[tokio::test]
async fn test_destroy_removes_everything_group_last() {
    let provider = Arc::new(MemoryProvider::new());
    let store = MemoryStateStore::new();
    let config = shop_dev_config();
    commands::up(provider.clone(), &store, &config).await.unwrap();

    let deleted = commands::destroy(provider.as_ref(), &store, &config)
        .await
        .unwrap();

    assert_eq!(deleted.len(), 9);
    assert_eq!(deleted.last().unwrap().name(), "shop-dev-rg");
    let container = deleted.iter().position(|urn| urn.name() == "users").unwrap();
    let database = deleted.iter().position(|urn| urn.name() == "shop-dev-db").unwrap();
    assert!(container < database);

    assert!(provider.resource_ids().await.is_empty());
    assert!(store.load("shop/dev").await.unwrap().is_none());

    // Nothing left to destroy
    assert!(commands::destroy(provider.as_ref(), &store, &config)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_hyphenated_project_yields_alphanumeric_storage_account() {
    let provider = Arc::new(MemoryProvider::new());
    let store = MemoryStateStore::new();
    let config = DeploymentConfig {
        project_name: "my-shop".to_string(),
        ..shop_dev_config()
    };

    let state = commands::up(provider, &store, &config).await.unwrap();
    assert!(state
        .resources
        .iter()
        .any(|resource| resource.urn.name() == "myshopdevsa"));
    assert_eq!(state.outputs["webAppName"].display(false), "my-shop-dev-web");
}
