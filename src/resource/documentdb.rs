//! # Document Database
//!
//! Cosmos DB account, SQL database and SQL container, plus the master-key
//! listing the web application needs.

use crate::constants::PARTITION_KEY_PATH;
use crate::error::DeployError;
use crate::output::Output;
use crate::provider::DatabaseAccountKeys;
use crate::resource::{DesiredState, Resource, ResourceKind, ResourcePath, ResourceState};
use crate::stack::{Stack, Urn};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

const NAMESPACE: &str = "Microsoft.DocumentDB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DatabaseAccountOfferType {
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefaultConsistencyLevel {
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyPolicy {
    pub default_consistency_level: DefaultConsistencyLevel,
}

/// Replica location of an account
#[derive(Debug, Clone)]
pub struct Location {
    pub location_name: Output<String>,
    pub failover_priority: u32,
}

#[derive(Debug, Clone)]
pub struct DatabaseAccountArgs {
    pub account_name: String,
    pub resource_group_name: Output<String>,
    pub location: Output<String>,
    pub offer_type: DatabaseAccountOfferType,
    pub locations: Vec<Location>,
    pub consistency_policy: ConsistencyPolicy,
}

impl DatabaseAccountArgs {
    /// Standard single-region account with session consistency
    pub fn single_region(
        account_name: impl Into<String>,
        resource_group_name: Output<String>,
        location: Output<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            resource_group_name,
            locations: vec![Location {
                location_name: location.clone(),
                failover_priority: 0,
            }],
            location,
            offer_type: DatabaseAccountOfferType::Standard,
            consistency_policy: ConsistencyPolicy {
                default_consistency_level: DefaultConsistencyLevel::Session,
            },
        }
    }
}

impl Resource for DatabaseAccountArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DatabaseAccount
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let account_name = self.account_name.clone();
        let offer_type = self.offer_type;
        let consistency_policy = self.consistency_policy;
        let priorities: Vec<u32> = self
            .locations
            .iter()
            .map(|location| location.failover_priority)
            .collect();
        let location_names = Output::all(
            self.locations
                .iter()
                .map(|location| location.location_name.clone()),
        );

        self.resource_group_name
            .zip(&self.location)
            .zip(&location_names)
            .apply(move |((resource_group, location), names)| {
                let locations: Vec<_> = names
                    .into_iter()
                    .zip(priorities)
                    .map(|(location_name, failover_priority)| {
                        json!({
                            "locationName": location_name,
                            "failoverPriority": failover_priority,
                        })
                    })
                    .collect();

                DesiredState {
                    kind: ResourceKind::DatabaseAccount,
                    path: ResourcePath::provider(
                        resource_group,
                        NAMESPACE,
                        "databaseAccounts",
                        account_name,
                    ),
                    body: json!({
                        "location": location,
                        "properties": {
                            "databaseAccountOfferType": offer_type,
                            "locations": locations,
                            "consistencyPolicy": consistency_policy,
                        },
                    }),
                }
            })
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseAccount {
    state: ResourceState,
}

impl DatabaseAccount {
    /// # Errors
    /// Returns an error if an account with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: DatabaseAccountArgs) -> Result<Self, DeployError> {
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

    #[must_use]
    pub fn document_endpoint(&self) -> Output<String> {
        self.state.field("/properties/documentEndpoint")
    }
}

/// Master keys of an account, fetched once both names are known
///
/// The result is secret.
#[must_use]
pub fn list_database_account_keys(
    stack: &Stack,
    resource_group_name: &Output<String>,
    account_name: &Output<String>,
) -> Output<DatabaseAccountKeys> {
    let provider = stack.provider();
    resource_group_name
        .zip(account_name)
        .apply_async(move |(resource_group, account)| async move {
            debug!(account = %account, "Listing database account keys");
            provider
                .list_database_account_keys(&resource_group, &account)
                .await
                .map_err(|e| DeployError::key_listing(&account, &e))
        })
        .into_secret()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SqlDatabaseArgs {
    pub database_name: String,
    pub resource_group_name: Output<String>,
    pub account_name: Output<String>,
    pub options: CreateUpdateOptions,
}

impl Resource for SqlDatabaseArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SqlDatabase
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let database_name = self.database_name.clone();
        let options = self.options;
        self.resource_group_name
            .zip(&self.account_name)
            .apply(move |(resource_group, account)| DesiredState {
                kind: ResourceKind::SqlDatabase,
                path: ResourcePath::provider(resource_group, NAMESPACE, "databaseAccounts", account)
                    .child("sqlDatabases", &database_name),
                body: json!({
                    "properties": {
                        "resource": { "id": database_name },
                        "options": options,
                    },
                }),
            })
    }
}

#[derive(Debug, Clone)]
pub struct SqlDatabase {
    state: ResourceState,
}

impl SqlDatabase {
    /// # Errors
    /// Returns an error if a database with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: SqlDatabaseArgs) -> Result<Self, DeployError> {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PartitionKind {
    Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerPartitionKey {
    pub kind: PartitionKind,
    pub paths: Vec<String>,
}

/// Container definition; the partition key is always a hash on `/id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlContainerResource {
    id: String,
}

impl SqlContainerResource {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn partition_key(&self) -> ContainerPartitionKey {
        ContainerPartitionKey {
            kind: PartitionKind::Hash,
            paths: vec![PARTITION_KEY_PATH.to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlContainerArgs {
    pub container_name: String,
    pub resource_group_name: Output<String>,
    pub account_name: Output<String>,
    pub database_name: Output<String>,
    pub resource: SqlContainerResource,
}

impl Resource for SqlContainerArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::SqlContainer
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let container_name = self.container_name.clone();
        let resource_id = self.resource.id().to_string();
        let partition_key = self.resource.partition_key();
        self.resource_group_name
            .zip(&self.account_name)
            .zip(&self.database_name)
            .apply(move |((resource_group, account), database)| DesiredState {
                kind: ResourceKind::SqlContainer,
                path: ResourcePath::provider(resource_group, NAMESPACE, "databaseAccounts", account)
                    .child("sqlDatabases", database)
                    .child("containers", container_name),
                // No options: throughput is shared from the database
                body: json!({
                    "properties": {
                        "resource": {
                            "id": resource_id,
                            "partitionKey": partition_key,
                        },
                        "options": {},
                    },
                }),
            })
    }
}

#[derive(Debug, Clone)]
pub struct SqlContainer {
    state: ResourceState,
}

impl SqlContainer {
    /// # Errors
    /// Returns an error if a container with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: SqlContainerArgs) -> Result<Self, DeployError> {
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
