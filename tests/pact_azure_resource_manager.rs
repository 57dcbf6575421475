//! Pact contract tests for the Azure Resource Manager REST API
//!
//! These tests define the contract between the Infra Deployer and Azure
//! Resource Manager. Each test drives `AzureResourceManager` against a Pact
//! mock server.
//!
//! Azure Resource Manager endpoints:
//! - PUT {id}?api-version= - Create or update a resource
//! - GET {id}?api-version= - Read a resource (provisioning state polling)
//! - DELETE {id}?api-version= - Delete a resource
//! - POST {id}/listKeys?api-version= - List account keys
//! - GET {Azure-AsyncOperation} / GET {Location} - Progress of an accepted request

mod common;

use common::init_rustls;
use infra_deployer::config::AccessToken;
use infra_deployer::provider::azure::AzureResourceManager;
use infra_deployer::provider::ResourceProvider;
use infra_deployer::resource::{DesiredState, ResourceKind, ResourcePath};
use pact_consumer::builders::InteractionBuilder;
use pact_consumer::prelude::*;
use serde_json::json;
use std::time::Duration;

const SUBSCRIPTION: &str = "sub-1";
const GROUP_ID: &str = "/subscriptions/sub-1/resourceGroups/shop-dev-rg";
const STORAGE_ID: &str =
    "/subscriptions/sub-1/resourceGroups/shop-dev-rg/providers/Microsoft.Storage/storageAccounts/shopdevsa";
const STORAGE_KEYS_PATH: &str =
    "/subscriptions/sub-1/resourceGroups/shop-dev-rg/providers/Microsoft.Storage/storageAccounts/shopdevsa/listKeys";
const COSMOS_KEYS_PATH: &str =
    "/subscriptions/sub-1/resourceGroups/shop-dev-rg/providers/Microsoft.DocumentDB/databaseAccounts/shop-dev-cdb/listKeys";
const DATABASE_ID: &str =
    "/subscriptions/sub-1/resourceGroups/shop-dev-rg/providers/Microsoft.DocumentDB/databaseAccounts/shop-dev-cdb/sqlDatabases/shop-dev-db";
const OPERATION_PATH: &str =
    "/subscriptions/sub-1/providers/Microsoft.DocumentDB/locations/eastus/operationsStatus/op-1";
const OPERATION_RESULT_PATH: &str =
    "/subscriptions/sub-1/providers/Microsoft.DocumentDB/locations/eastus/operationResults/op-2";

fn client(mock_url: &str) -> AzureResourceManager {
    init_rustls();
    AzureResourceManager::with_endpoint(mock_url, SUBSCRIPTION, AccessToken::new("test-token"))
        .expect("Failed to create ARM client")
        .with_polling(Duration::from_millis(10), Duration::from_secs(5))
}

fn resource_group() -> DesiredState {
    DesiredState {
        kind: ResourceKind::ResourceGroup,
        path: ResourcePath::resource_group("shop-dev-rg"),
        body: json!({"location": "eastus"}),
    }
}

fn storage_account() -> DesiredState {
    DesiredState {
        kind: ResourceKind::StorageAccount,
        path: ResourcePath::provider(
            "shop-dev-rg",
            "Microsoft.Storage",
            "storageAccounts",
            "shopdevsa",
        ),
        body: json!({
            "kind": "StorageV2",
            "location": "eastus",
            "sku": {"name": "Standard_LRS"}
        }),
    }
}

fn sql_database() -> DesiredState {
    DesiredState {
        kind: ResourceKind::SqlDatabase,
        path: ResourcePath::provider(
            "shop-dev-rg",
            "Microsoft.DocumentDB",
            "databaseAccounts",
            "shop-dev-cdb",
        )
        .child("sqlDatabases", "shop-dev-db"),
        body: json!({
            "properties": {
                "resource": {"id": "shop-dev-db"},
                "options": {"throughput": 400}
            }
        }),
    }
}

fn accept_database_put(i: &mut InteractionBuilder, header: Option<(&str, &str)>) {
    i.request
        .method("PUT")
        .path(DATABASE_ID)
        .query_param("api-version", "2023-04-15")
        .header("authorization", "Bearer test-token");
    i.response.status(202);
    if let Some((name, value)) = header {
        i.response.header(name, value);
    }
}

#[tokio::test]
async fn test_arm_put_resource_group_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder.interaction("create or update a resource group", "", |mut i| {
        i.given("the subscription exists and credentials are configured");
        i.request
            .method("PUT")
            .path(GROUP_ID)
            .query_param("api-version", "2021-04-01")
            .header("authorization", "Bearer test-token")
            .json_body(json!({"location": "eastus"}));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": GROUP_ID,
                "name": "shop-dev-rg",
                "location": "eastus",
                "properties": {"provisioningState": "Succeeded"}
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let state = arm
        .create_or_update(&resource_group())
        .await
        .expect("PUT should succeed");
    assert_eq!(state["name"], "shop-dev-rg");
    assert_eq!(state["properties"]["provisioningState"], "Succeeded");
}

#[tokio::test]
async fn test_arm_put_polls_until_provisioned_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder
        .interaction("create a storage account", "", |mut i| {
            i.given("the resource group exists");
            i.request
                .method("PUT")
                .path(STORAGE_ID)
                .query_param("api-version", "2023-01-01")
                .header("authorization", "Bearer test-token")
                .json_body(json!({
                    "kind": "StorageV2",
                    "location": "eastus",
                    "sku": {"name": "Standard_LRS"}
                }));
            i.response
                .status(201)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": STORAGE_ID,
                    "name": "shopdevsa",
                    "properties": {"provisioningState": "Creating"}
                }));
            i
        })
        .interaction("read a provisioned storage account", "", |mut i| {
            i.given("the storage account has finished provisioning");
            i.request
                .method("GET")
                .path(STORAGE_ID)
                .query_param("api-version", "2023-01-01")
                .header("authorization", "Bearer test-token");
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": STORAGE_ID,
                    "name": "shopdevsa",
                    "properties": {"provisioningState": "Succeeded"}
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let state = arm
        .create_or_update(&storage_account())
        .await
        .expect("PUT should succeed after polling");
    assert_eq!(state["properties"]["provisioningState"], "Succeeded");
}

#[tokio::test]
async fn test_arm_put_error_is_surfaced_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder.interaction("create a storage account in a missing group", "", |mut i| {
        i.given("the resource group does not exist");
        i.request
            .method("PUT")
            .path(STORAGE_ID)
            .query_param("api-version", "2023-01-01")
            .header("authorization", "Bearer test-token");
        i.response
            .status(404)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": "ResourceGroupNotFound",
                    "message": "Resource group 'shop-dev-rg' could not be found."
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let error = arm
        .create_or_update(&storage_account())
        .await
        .expect_err("PUT should fail");
    let message = format!("{error:#}");
    assert!(message.contains("ResourceGroupNotFound"), "{message}");
    assert!(message.contains("HTTP 404"), "{message}");
}

#[tokio::test]
async fn test_arm_list_storage_keys_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder.interaction("list the keys of a storage account", "", |mut i| {
        i.given("the storage account exists");
        i.request
            .method("POST")
            .path(STORAGE_KEYS_PATH)
            .query_param("api-version", "2023-01-01")
            .header("authorization", "Bearer test-token");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "keys": [
                    {"keyName": "key1", "value": "k1", "permissions": "FULL"},
                    {"keyName": "key2", "value": "k2", "permissions": "FULL"}
                ]
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let keys = arm
        .list_storage_account_keys("shop-dev-rg", "shopdevsa")
        .await
        .expect("listKeys should succeed");
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].key_name, "key1");
    assert_eq!(keys[0].value, "k1");
}

#[tokio::test]
async fn test_arm_list_database_account_keys_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder.interaction("list the keys of a database account", "", |mut i| {
        i.given("the database account exists");
        i.request
            .method("POST")
            .path(COSMOS_KEYS_PATH)
            .query_param("api-version", "2023-04-15")
            .header("authorization", "Bearer test-token");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "primaryMasterKey": "primary",
                "secondaryMasterKey": "secondary",
                "primaryReadonlyMasterKey": "primary-ro",
                "secondaryReadonlyMasterKey": "secondary-ro"
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let keys = arm
        .list_database_account_keys("shop-dev-rg", "shop-dev-cdb")
        .await
        .expect("listKeys should succeed");
    assert_eq!(keys.primary_master_key, "primary");
    assert_eq!(keys.secondary_readonly_master_key, "secondary-ro");
}

#[tokio::test]
async fn test_arm_delete_waits_for_removal_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder
        .interaction("delete a resource group", "", |mut i| {
            i.given("the resource group exists");
            i.request
                .method("DELETE")
                .path(GROUP_ID)
                .query_param("api-version", "2021-04-01")
                .header("authorization", "Bearer test-token");
            i.response.status(202);
            i
        })
        .interaction("read a deleted resource group", "", |mut i| {
            i.given("the resource group has been deleted");
            i.request
                .method("GET")
                .path(GROUP_ID)
                .query_param("api-version", "2021-04-01")
                .header("authorization", "Bearer test-token");
            i.response
                .status(404)
                .header("content-type", "application/json")
                .json_body(json!({
                    "error": {
                        "code": "ResourceGroupNotFound",
                        "message": "Resource group 'shop-dev-rg' could not be found."
                    }
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    arm.delete(ResourceKind::ResourceGroup, GROUP_ID)
        .await
        .expect("DELETE should succeed once the group is gone");
}

#[tokio::test]
async fn test_arm_delete_missing_resource_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder.interaction("delete a storage account that does not exist", "", |mut i| {
        i.given("the storage account does not exist");
        i.request
            .method("DELETE")
            .path(STORAGE_ID)
            .query_param("api-version", "2023-01-01")
            .header("authorization", "Bearer test-token");
        i.response.status(404);
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    arm.delete(ResourceKind::StorageAccount, STORAGE_ID)
        .await
        .expect("deleting a missing resource is not an error");
}

#[tokio::test]
async fn test_arm_put_follows_async_operation_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");
    let operation_url = format!("{OPERATION_PATH}?api-version=2023-04-15");

    pact_builder
        .interaction("create a SQL database asynchronously", "", |mut i| {
            i.given("the database account exists");
            accept_database_put(&mut i, Some(("Azure-AsyncOperation", operation_url.as_str())));
            i
        })
        .interaction("read a completed database operation", "", |mut i| {
            i.given("the database creation has finished");
            i.request
                .method("GET")
                .path(OPERATION_PATH)
                .query_param("api-version", "2023-04-15")
                .header("authorization", "Bearer test-token");
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({"status": "Succeeded"}));
            i
        })
        .interaction("read a provisioned SQL database", "", |mut i| {
            i.given("the database exists");
            i.request
                .method("GET")
                .path(DATABASE_ID)
                .query_param("api-version", "2023-04-15")
                .header("authorization", "Bearer test-token");
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": DATABASE_ID,
                    "name": "shop-dev-db",
                    "properties": {"resource": {"id": "shop-dev-db"}}
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let state = arm
        .create_or_update(&sql_database())
        .await
        .expect("PUT should succeed once the operation completes");
    assert_eq!(state["name"], "shop-dev-db");
}

#[tokio::test]
async fn test_arm_put_failed_async_operation_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");
    let operation_url = format!("{OPERATION_PATH}?api-version=2023-04-15");

    pact_builder
        .interaction("create a SQL database whose operation fails", "", |mut i| {
            i.given("the database account exists");
            accept_database_put(&mut i, Some(("Azure-AsyncOperation", operation_url.as_str())));
            i
        })
        .interaction("read a failed database operation", "", |mut i| {
            i.given("the database creation has failed");
            i.request
                .method("GET")
                .path(OPERATION_PATH)
                .query_param("api-version", "2023-04-15")
                .header("authorization", "Bearer test-token");
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "status": "Failed",
                    "error": {
                        "code": "BadRequest",
                        "message": "Throughput is below the minimum of 400 RU/s"
                    }
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let error = arm
        .create_or_update(&sql_database())
        .await
        .expect_err("a failed operation fails the PUT");
    let message = format!("{error:#}");
    assert!(message.contains("BadRequest"), "{message}");
}

#[tokio::test]
async fn test_arm_put_follows_location_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder
        .interaction("create a SQL database with a result location", "", |mut i| {
            i.given("the database account exists");
            accept_database_put(&mut i, Some(("Location", OPERATION_RESULT_PATH)));
            i
        })
        .interaction("read a completed database operation result", "", |mut i| {
            i.given("the database creation has finished");
            i.request
                .method("GET")
                .path(OPERATION_RESULT_PATH)
                .header("authorization", "Bearer test-token");
            i.response.status(204);
            i
        })
        .interaction("read a SQL database created through a result location", "", |mut i| {
            i.given("the database exists and reports its provisioning state");
            i.request
                .method("GET")
                .path(DATABASE_ID)
                .query_param("api-version", "2023-04-15")
                .header("authorization", "Bearer test-token");
            i.response
                .status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "id": DATABASE_ID,
                    "name": "shop-dev-db",
                    "properties": {"provisioningState": "Succeeded"}
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    let arm = client(mock_server.url().as_str());

    let state = arm
        .create_or_update(&sql_database())
        .await
        .expect("PUT should succeed once the result location completes");
    assert_eq!(state["properties"]["provisioningState"], "Succeeded");
}

#[tokio::test]
async fn test_arm_accepted_resource_not_yet_visible_contract() {
    let mut pact_builder = PactBuilder::new("Infra-Deployer", "Azure-Resource-Manager");

    pact_builder
        .interaction("create a SQL database without progress headers", "", |mut i| {
            i.given("the database account exists");
            accept_database_put(&mut i, None);
            i
        })
        .interaction("read a SQL database that is still being created", "", |mut i| {
            i.given("the database is not visible yet");
            i.request
                .method("GET")
                .path(DATABASE_ID)
                .query_param("api-version", "2023-04-15")
                .header("authorization", "Bearer test-token");
            i.response
                .status(404)
                .header("content-type", "application/json")
                .json_body(json!({
                    "error": {"code": "NotFound", "message": "Database shop-dev-db not found."}
                }));
            i
        });

    let mock_server = pact_builder.start_mock_server(None, None);
    init_rustls();
    let arm = AzureResourceManager::with_endpoint(
        mock_server.url().as_str(),
        SUBSCRIPTION,
        AccessToken::new("test-token"),
    )
    .expect("Failed to create ARM client")
    .with_polling(Duration::from_millis(10), Duration::from_millis(200));

    // 404 keeps the PUT waiting until the operation timeout
    let error = arm
        .create_or_update(&sql_database())
        .await
        .expect_err("the resource never appears");
    let message = format!("{error:#}");
    assert!(message.contains("Timed out"), "{message}");
}
