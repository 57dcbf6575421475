//! # In-Memory Provider
//!
//! Simulates Azure Resource Manager in process.
//!
//! Resources are kept by ARM id. Creating a resource inside a resource group
//! that does not exist fails, the same way ARM rejects it, so data-dependency
//! ordering is observable in tests. Deleting a resource group removes every
//! resource inside it.
//!
//! In preview mode values that only the cloud can produce (instrumentation
//! keys, access keys) are reported as `[unknown]`.
//!
//! This is ephemeral - data does not persist across restarts.

use crate::constants::{MEMORY_SUBSCRIPTION_ID, UNKNOWN_VALUE};
use crate::provider::{DatabaseAccountKeys, ResourceProvider, StorageAccountKey};
use crate::resource::{DesiredState, ResourceKind, ResourcePath};
use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A call observed by the provider, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryOperation {
    CreateOrUpdate(String),
    Delete(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Simulate,
    Preview,
}

#[derive(Debug)]
pub struct MemoryProvider {
    mode: Mode,
    subscription_id: String,
    resources: RwLock<BTreeMap<String, Value>>,
    storage_keys: RwLock<HashMap<String, Vec<StorageAccountKey>>>,
    failing: RwLock<HashSet<String>>,
    operations: RwLock<Vec<MemoryOperation>>,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    /// Simulating provider with deterministic key material
    #[must_use]
    pub fn new() -> Self {
        Self::with_mode(Mode::Simulate)
    }

    /// Provider for `preview`: cloud-generated values stay unknown
    #[must_use]
    pub fn preview() -> Self {
        Self::with_mode(Mode::Preview)
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            subscription_id: MEMORY_SUBSCRIPTION_ID.to_string(),
            resources: RwLock::new(BTreeMap::new()),
            storage_keys: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            operations: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_subscription(mut self, subscription_id: impl Into<String>) -> Self {
        self.subscription_id = subscription_id.into();
        self
    }

    /// Fix the keys returned for a storage account, whether or not it exists
    #[must_use]
    pub fn with_storage_keys(mut self, account_name: &str, keys: &[(&str, &str)]) -> Self {
        let keys = keys
            .iter()
            .map(|(key_name, value)| StorageAccountKey {
                key_name: (*key_name).to_string(),
                value: (*value).to_string(),
                permissions: "FULL".to_string(),
            })
            .collect();
        self.storage_keys
            .get_mut()
            .insert(account_name.to_string(), keys);
        self
    }

    /// Make create-or-update of the named resource fail
    #[must_use]
    pub fn failing_on(mut self, resource_name: &str) -> Self {
        self.failing.get_mut().insert(resource_name.to_string());
        self
    }

    pub async fn operations(&self) -> Vec<MemoryOperation> {
        self.operations.read().await.clone()
    }

    pub async fn resource_ids(&self) -> Vec<String> {
        self.resources.read().await.keys().cloned().collect()
    }

    pub async fn resource(&self, id: &str) -> Option<Value> {
        self.resources.read().await.get(id).cloned()
    }

    fn derive_key(id: &str, key_name: &str) -> String {
        let digest = Sha256::digest(format!("{id}/{key_name}").as_bytes());
        general_purpose::STANDARD.encode(digest)
    }

    fn computed(&self, value: impl FnOnce() -> String) -> String {
        match self.mode {
            Mode::Simulate => value(),
            Mode::Preview => UNKNOWN_VALUE.to_string(),
        }
    }

    async fn require_exists(&self, id: &str, what: &str) -> Result<()> {
        if !self.resources.read().await.contains_key(id) {
            bail!("{what}NotFound: {id} does not exist");
        }
        Ok(())
    }

    fn resource_group_id(&self, path: &ResourcePath) -> String {
        ResourcePath::resource_group(path.resource_group_name()).to_id(&self.subscription_id)
    }

    /// Fields ARM fills in on top of the submitted body
    fn reported_state(&self, desired: &DesiredState, id: &str, previous: Option<&Value>) -> Value {
        let mut state = desired.body.clone();
        if !state.is_object() {
            state = json!({});
        }
        state["id"] = json!(id);
        state["name"] = json!(desired.path.name());
        state["type"] = json!(desired.kind.arm_type());
        if state.get("properties").is_none() {
            state["properties"] = json!({});
        }
        state["properties"]["provisioningState"] = json!("Succeeded");

        match desired.kind {
            ResourceKind::InsightsComponent => {
                let key = previous
                    .and_then(|previous| previous.pointer("/properties/InstrumentationKey"))
                    .and_then(Value::as_str)
                    .map_or_else(
                        || self.computed(|| uuid::Uuid::new_v4().to_string()),
                        str::to_string,
                    );
                state["properties"]["ConnectionString"] = json!(format!("InstrumentationKey={key}"));
                state["properties"]["InstrumentationKey"] = json!(key);
            }
            ResourceKind::DatabaseAccount => {
                state["properties"]["documentEndpoint"] = json!(format!(
                    "https://{}.documents.azure.com:443/",
                    desired.path.name()
                ));
            }
            ResourceKind::WebApp => {
                state["properties"]["defaultHostName"] =
                    json!(format!("{}.azurewebsites.net", desired.path.name()));
            }
            _ => {}
        }
        state
    }
}

#[async_trait]
impl ResourceProvider for MemoryProvider {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn create_or_update(&self, desired: &DesiredState) -> Result<Value> {
        let id = desired.path.to_id(&self.subscription_id);
        self.operations
            .write()
            .await
            .push(MemoryOperation::CreateOrUpdate(id.clone()));

        if self.failing.read().await.contains(desired.path.name()) {
            bail!("Conflict: {} cannot be provisioned", desired.path.name());
        }
        if desired.kind != ResourceKind::ResourceGroup {
            self.require_exists(&self.resource_group_id(&desired.path), "ResourceGroup")
                .await?;
        }

        let mut resources = self.resources.write().await;
        let operation = if resources.contains_key(&id) { "update" } else { "create" };
        let state = self.reported_state(desired, &id, resources.get(&id));
        resources.insert(id.clone(), state.clone());

        info!(provider = "memory", id = %id, operation = operation, "Resource provisioned");
        Ok(state)
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()> {
        self.operations
            .write()
            .await
            .push(MemoryOperation::Delete(id.to_string()));

        let mut resources = self.resources.write().await;
        let prefix = format!("{id}/");
        let before = resources.len();
        resources.retain(|existing, _| existing != id && !existing.starts_with(&prefix));

        debug!(
            provider = "memory",
            kind = %kind,
            id = id,
            removed = before - resources.len(),
            "Resource deleted"
        );
        Ok(())
    }

    async fn list_storage_account_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        if let Some(keys) = self.storage_keys.read().await.get(account_name) {
            return Ok(keys.clone());
        }

        let id = ResourcePath::provider(resource_group, "Microsoft.Storage", "storageAccounts", account_name)
            .to_id(&self.subscription_id);
        self.require_exists(&id, "StorageAccount").await?;

        Ok(["key1", "key2"]
            .into_iter()
            .map(|key_name| StorageAccountKey {
                key_name: key_name.to_string(),
                value: self.computed(|| Self::derive_key(&id, key_name)),
                permissions: "FULL".to_string(),
            })
            .collect())
    }

    async fn list_database_account_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<DatabaseAccountKeys> {
        let id = ResourcePath::provider(
            resource_group,
            "Microsoft.DocumentDB",
            "databaseAccounts",
            account_name,
        )
        .to_id(&self.subscription_id);
        self.require_exists(&id, "DatabaseAccount").await?;

        Ok(DatabaseAccountKeys {
            primary_master_key: self.computed(|| Self::derive_key(&id, "primaryMasterKey")),
            secondary_master_key: self.computed(|| Self::derive_key(&id, "secondaryMasterKey")),
            primary_readonly_master_key: self
                .computed(|| Self::derive_key(&id, "primaryReadonlyMasterKey")),
            secondary_readonly_master_key: self
                .computed(|| Self::derive_key(&id, "secondaryReadonlyMasterKey")),
        })
    }
}
