//! # Provider Modules
//!
//! A provider turns desired-state records into real resources.
//!
//! - `azure`: Azure Resource Manager REST API
//! - `memory`: in-process simulation for previews and tests

use crate::resource::{DesiredState, ResourceKind};
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Provider trait for resource provisioning
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Subscription all resource ids are scoped to
    fn subscription_id(&self) -> &str;

    /// Create or update a resource and wait until it is provisioned
    /// Returns the provider-reported state (id, name, location, properties)
    async fn create_or_update(&self, desired: &DesiredState) -> Result<Value>;

    /// Delete a resource by id. Deleting a missing resource succeeds.
    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()>;

    /// List the access keys of a storage account
    async fn list_storage_account_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>>;

    /// List the master keys of a document database account
    async fn list_database_account_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<DatabaseAccountKeys>;
}

/// One access key of a storage account
#[derive(Clone, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountKey {
    pub key_name: String,
    pub value: String,
    #[serde(default)]
    pub permissions: String,
}

impl std::fmt::Debug for StorageAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccountKey")
            .field("key_name", &self.key_name)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// Master keys of a document database account
#[derive(Clone, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseAccountKeys {
    pub primary_master_key: String,
    #[serde(default)]
    pub secondary_master_key: String,
    #[serde(default)]
    pub primary_readonly_master_key: String,
    #[serde(default)]
    pub secondary_readonly_master_key: String,
}

impl std::fmt::Debug for DatabaseAccountKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseAccountKeys").finish_non_exhaustive()
    }
}

pub mod azure;
pub mod memory;
