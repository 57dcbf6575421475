//! Application Insights component.

use crate::error::DeployError;
use crate::output::Output;
use crate::resource::{DesiredState, Resource, ResourceKind, ResourcePath, ResourceState};
use crate::stack::{Stack, Urn};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    Web,
}

#[derive(Debug, Clone)]
pub struct ComponentArgs {
    pub resource_name: String,
    pub resource_group_name: Output<String>,
    pub location: Output<String>,
    pub kind: String,
    pub application_type: ApplicationType,
}

impl ComponentArgs {
    /// Component monitoring a web application
    pub fn web(
        resource_name: impl Into<String>,
        resource_group_name: Output<String>,
        location: Output<String>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            resource_group_name,
            location,
            kind: "web".to_string(),
            application_type: ApplicationType::Web,
        }
    }
}

impl Resource for ComponentArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::InsightsComponent
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let resource_name = self.resource_name.clone();
        let kind = self.kind.clone();
        let application_type = self.application_type;
        self.resource_group_name
            .zip(&self.location)
            .apply(move |(resource_group, location)| DesiredState {
                kind: ResourceKind::InsightsComponent,
                path: ResourcePath::provider(
                    resource_group,
                    "Microsoft.Insights",
                    "components",
                    resource_name,
                ),
                body: json!({
                    "location": location,
                    "kind": kind,
                    "properties": { "Application_Type": application_type },
                }),
            })
    }
}

#[derive(Debug, Clone)]
pub struct Component {
    state: ResourceState,
}

impl Component {
    /// # Errors
    /// Returns an error if a component with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: ComponentArgs) -> Result<Self, DeployError> {
        Ok(Self {
            state: stack.register(name, &args)?,
        })
    }

    #[must_use]
    pub fn urn(&self) -> &Urn {
        self.state.urn()
    }

    /// Routes telemetry to this component; treated as secret
    #[must_use]
    pub fn instrumentation_key(&self) -> Output<String> {
        self.state
            .field("/properties/InstrumentationKey")
            .into_secret()
    }
}
