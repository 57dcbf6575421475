//! Storage account and its access-key listing.

use crate::error::DeployError;
use crate::output::Output;
use crate::provider::StorageAccountKey;
use crate::resource::{DesiredState, Resource, ResourceKind, ResourcePath, ResourceState};
use crate::stack::{Stack, Urn};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkuName {
    #[serde(rename = "Standard_LRS")]
    StandardLrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StorageKind {
    StorageV2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StorageSku {
    pub name: SkuName,
}

#[derive(Debug, Clone)]
pub struct StorageAccountArgs {
    pub account_name: String,
    pub resource_group_name: Output<String>,
    pub location: Output<String>,
    pub sku: StorageSku,
    pub kind: StorageKind,
}

impl StorageAccountArgs {
    /// Locally redundant general-purpose v2 account
    pub fn new(
        account_name: impl Into<String>,
        resource_group_name: Output<String>,
        location: Output<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            resource_group_name,
            location,
            sku: StorageSku {
                name: SkuName::StandardLrs,
            },
            kind: StorageKind::StorageV2,
        }
    }
}

impl Resource for StorageAccountArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::StorageAccount
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let account_name = self.account_name.clone();
        let sku = self.sku;
        let kind = self.kind;
        self.resource_group_name
            .zip(&self.location)
            .apply(move |(resource_group, location)| DesiredState {
                kind: ResourceKind::StorageAccount,
                path: ResourcePath::provider(
                    resource_group,
                    "Microsoft.Storage",
                    "storageAccounts",
                    account_name,
                ),
                body: json!({
                    "location": location,
                    "sku": sku,
                    "kind": kind,
                    "properties": {},
                }),
            })
    }
}

#[derive(Debug, Clone)]
pub struct StorageAccount {
    state: ResourceState,
}

impl StorageAccount {
    /// # Errors
    /// Returns an error if an account with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: StorageAccountArgs) -> Result<Self, DeployError> {
        Ok(Self {
            state: stack.register(name, &args)?,
        })
    }

    #[must_use]
    pub fn urn(&self) -> &Urn {
        self.state.urn()
    }

    #[must_use]
    pub fn name(&self) -> Output<String> {
        self.state.name()
    }
}

/// Access keys of a storage account, fetched once both names are known
///
/// The result is secret.
#[must_use]
pub fn list_storage_account_keys(
    stack: &Stack,
    resource_group_name: &Output<String>,
    account_name: &Output<String>,
) -> Output<Vec<StorageAccountKey>> {
    let provider = stack.provider();
    resource_group_name
        .zip(account_name)
        .apply_async(move |(resource_group, account)| async move {
            debug!(account = %account, "Listing storage account keys");
            provider
                .list_storage_account_keys(&resource_group, &account)
                .await
                .map_err(|e| DeployError::key_listing(&account, &e))
        })
        .into_secret()
}
