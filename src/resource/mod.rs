//! # Resources
//!
//! Desired-state records for every resource in the topology.
//!
//! Each record is a pure mapping from literal or derived configuration to
//! the Azure Resource Manager schema of its type. Records implement
//! [`Resource`]; registering one with a [`Stack`](crate::stack::Stack)
//! yields a [`ResourceState`] whose outputs other records consume.

use crate::error::DeployError;
use crate::output::Output;
use crate::stack::Urn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod documentdb;
pub mod insights;
pub mod resource_group;
pub mod storage;
pub mod web;

/// Resource types the deployer knows how to declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    ResourceGroup,
    StorageAccount,
    InsightsComponent,
    AppServicePlan,
    WebApp,
    DatabaseAccount,
    SqlDatabase,
    SqlContainer,
}

impl ResourceKind {
    /// Fully qualified ARM resource type
    #[must_use]
    pub fn arm_type(self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "Microsoft.Resources/resourceGroups",
            ResourceKind::StorageAccount => "Microsoft.Storage/storageAccounts",
            ResourceKind::InsightsComponent => "Microsoft.Insights/components",
            ResourceKind::AppServicePlan => "Microsoft.Web/serverfarms",
            ResourceKind::WebApp => "Microsoft.Web/sites",
            ResourceKind::DatabaseAccount => "Microsoft.DocumentDB/databaseAccounts",
            ResourceKind::SqlDatabase => "Microsoft.DocumentDB/databaseAccounts/sqlDatabases",
            ResourceKind::SqlContainer => {
                "Microsoft.DocumentDB/databaseAccounts/sqlDatabases/containers"
            }
        }
    }

    /// `api-version` used for every request against this type
    #[must_use]
    pub fn api_version(self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "2021-04-01",
            ResourceKind::StorageAccount => "2023-01-01",
            ResourceKind::InsightsComponent => "2020-02-02",
            ResourceKind::AppServicePlan | ResourceKind::WebApp => "2022-09-01",
            ResourceKind::DatabaseAccount
            | ResourceKind::SqlDatabase
            | ResourceKind::SqlContainer => "2023-04-15",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arm_type())
    }
}

/// Location of a resource inside a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    resource_group: String,
    namespace: Option<String>,
    segments: Vec<(String, String)>,
}

impl ResourcePath {
    /// The resource group itself
    pub fn resource_group(name: impl Into<String>) -> Self {
        Self {
            resource_group: name.into(),
            namespace: None,
            segments: Vec::new(),
        }
    }

    /// A top-level resource of a provider namespace inside a resource group
    pub fn provider(
        resource_group: impl Into<String>,
        namespace: &str,
        resource_type: &str,
        name: impl Into<String>,
    ) -> Self {
        Self {
            resource_group: resource_group.into(),
            namespace: Some(namespace.to_string()),
            segments: vec![(resource_type.to_string(), name.into())],
        }
    }

    /// A nested resource (e.g. a database inside an account)
    #[must_use]
    pub fn child(mut self, resource_type: &str, name: impl Into<String>) -> Self {
        self.segments.push((resource_type.to_string(), name.into()));
        self
    }

    #[must_use]
    pub fn resource_group_name(&self) -> &str {
        &self.resource_group
    }

    /// Leaf name of the resource
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map_or(self.resource_group.as_str(), |(_, name)| name.as_str())
    }

    /// ARM resource id within the given subscription
    #[must_use]
    pub fn to_id(&self, subscription_id: &str) -> String {
        let mut id = format!(
            "/subscriptions/{subscription_id}/resourceGroups/{}",
            self.resource_group
        );
        if let Some(namespace) = &self.namespace {
            id.push_str("/providers/");
            id.push_str(namespace);
        }
        for (resource_type, name) in &self.segments {
            id.push('/');
            id.push_str(resource_type);
            id.push('/');
            id.push_str(name);
        }
        id
    }
}

/// A fully resolved record, ready to be PUT
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredState {
    pub kind: ResourceKind,
    pub path: ResourcePath,
    pub body: Value,
}

/// A declarable resource
pub trait Resource {
    fn kind(&self) -> ResourceKind;

    /// The record to submit, known once every referenced output resolves
    fn desired_state(&self) -> Output<DesiredState>;
}

/// Handle to a registered resource and its provider-reported state
#[derive(Debug, Clone)]
pub struct ResourceState {
    urn: Urn,
    kind: ResourceKind,
    state: Output<Value>,
}

impl ResourceState {
    pub(crate) fn new(urn: Urn, kind: ResourceKind, state: Output<Value>) -> Self {
        Self { urn, kind, state }
    }

    #[must_use]
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Raw state as reported by the provider after create-or-update
    #[must_use]
    pub fn state(&self) -> &Output<Value> {
        &self.state
    }

    /// A string field of the reported state, addressed by JSON pointer
    #[must_use]
    pub fn field(&self, pointer: &str) -> Output<String> {
        let urn = self.urn.clone();
        let pointer = pointer.to_string();
        self.state.try_apply(move |state| {
            state
                .pointer(&pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(DeployError::MissingOutput {
                    urn,
                    field: pointer,
                })
        })
    }

    #[must_use]
    pub fn name(&self) -> Output<String> {
        self.field("/name")
    }

    #[must_use]
    pub fn id(&self) -> Output<String> {
        self.field("/id")
    }

    #[must_use]
    pub fn location(&self) -> Output<String> {
        self.field("/location")
    }
}
