//! Resource group: the root container every other resource lives in.

use crate::error::DeployError;
use crate::output::Output;
use crate::resource::{DesiredState, Resource, ResourceKind, ResourcePath, ResourceState};
use crate::stack::{Stack, Urn};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGroupArgs {
    pub resource_group_name: String,
    pub location: String,
}

impl ResourceGroupArgs {
    pub fn new(resource_group_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            resource_group_name: resource_group_name.into(),
            location: location.into(),
        }
    }
}

impl Resource for ResourceGroupArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ResourceGroup
    }

    fn desired_state(&self) -> Output<DesiredState> {
        Output::known(DesiredState {
            kind: self.kind(),
            path: ResourcePath::resource_group(&self.resource_group_name),
            body: json!({ "location": self.location }),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResourceGroup {
    state: ResourceState,
}

impl ResourceGroup {
    /// # Errors
    /// Returns an error if a resource group with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: ResourceGroupArgs) -> Result<Self, DeployError> {
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
    pub fn location(&self) -> Output<String> {
        self.state.location()
    }
}
