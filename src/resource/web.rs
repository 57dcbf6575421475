//! # App Service
//!
//! App Service plan and the sites (web and functions apps) hosted on it.
//!
//! Application settings are name/value pairs whose values may still be
//! unresolved when the site is declared; the site body is only built once
//! every value is known.

use crate::error::DeployError;
use crate::output::Output;
use crate::resource::{DesiredState, Resource, ResourceKind, ResourcePath, ResourceState};
use crate::stack::{Stack, Urn};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuDescription {
    pub name: String,
    pub tier: String,
}

#[derive(Debug, Clone)]
pub struct AppServicePlanArgs {
    pub name: String,
    pub resource_group_name: Output<String>,
    pub location: Output<String>,
    pub kind: String,
    /// Required for Linux plans
    pub reserved: bool,
    pub sku: SkuDescription,
}

impl AppServicePlanArgs {
    /// Linux plan of the given size and tier
    pub fn linux(
        name: impl Into<String>,
        resource_group_name: Output<String>,
        location: Output<String>,
        sku: SkuDescription,
    ) -> Self {
        Self {
            name: name.into(),
            resource_group_name,
            location,
            kind: "linux".to_string(),
            reserved: true,
            sku,
        }
    }
}

impl Resource for AppServicePlanArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AppServicePlan
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let name = self.name.clone();
        let kind = self.kind.clone();
        let reserved = self.reserved;
        let sku = self.sku.clone();
        self.resource_group_name
            .zip(&self.location)
            .apply(move |(resource_group, location)| DesiredState {
                kind: ResourceKind::AppServicePlan,
                path: ResourcePath::provider(resource_group, "Microsoft.Web", "serverfarms", name),
                body: json!({
                    "location": location,
                    "kind": kind,
                    "sku": sku,
                    "properties": { "reserved": reserved },
                }),
            })
    }
}

#[derive(Debug, Clone)]
pub struct AppServicePlan {
    state: ResourceState,
}

impl AppServicePlan {
    /// # Errors
    /// Returns an error if a plan with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: AppServicePlanArgs) -> Result<Self, DeployError> {
        Ok(Self {
            state: stack.register(name, &args)?,
        })
    }

    #[must_use]
    pub fn urn(&self) -> &Urn {
        self.state.urn()
    }

    #[must_use]
    pub fn id(&self) -> Output<String> {
        self.state.id()
    }
}

/// One application setting
#[derive(Debug, Clone)]
pub struct NameValuePair {
    pub name: String,
    pub value: Output<String>,
}

impl NameValuePair {
    pub fn new(name: impl Into<String>, value: impl Into<Output<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ResolvedSetting {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    pub app_settings: Vec<NameValuePair>,
    pub http20_enabled: Option<bool>,
    pub node_version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteConfigBody {
    app_settings: Vec<ResolvedSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    http20_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WebAppArgs {
    pub name: String,
    pub resource_group_name: Output<String>,
    pub location: Output<String>,
    pub server_farm_id: Output<String>,
    /// `None` for a plain web app, `functionapp` for a functions app
    pub kind: Option<String>,
    pub site_config: SiteConfig,
}

impl Resource for WebAppArgs {
    fn kind(&self) -> ResourceKind {
        ResourceKind::WebApp
    }

    fn desired_state(&self) -> Output<DesiredState> {
        let name = self.name.clone();
        let kind = self.kind.clone();
        let setting_names: Vec<String> = self
            .site_config
            .app_settings
            .iter()
            .map(|setting| setting.name.clone())
            .collect();
        let setting_values = Output::all(
            self.site_config
                .app_settings
                .iter()
                .map(|setting| setting.value.clone()),
        );
        let http20_enabled = self.site_config.http20_enabled;
        let node_version = self.site_config.node_version.clone();

        self.resource_group_name
            .zip(&self.location)
            .zip(&self.server_farm_id)
            .zip(&setting_values)
            .apply(move |(((resource_group, location), server_farm_id), values)| {
                let site_config = SiteConfigBody {
                    app_settings: setting_names
                        .into_iter()
                        .zip(values)
                        .map(|(name, value)| ResolvedSetting { name, value })
                        .collect(),
                    http20_enabled,
                    node_version,
                };

                let mut body = json!({
                    "location": location,
                    "properties": {
                        "serverFarmId": server_farm_id,
                        "siteConfig": site_config,
                    },
                });
                if let Some(kind) = kind {
                    body["kind"] = json!(kind);
                }

                DesiredState {
                    kind: ResourceKind::WebApp,
                    path: ResourcePath::provider(resource_group, "Microsoft.Web", "sites", name),
                    body,
                }
            })
    }
}

#[derive(Debug, Clone)]
pub struct WebApp {
    state: ResourceState,
}

impl WebApp {
    /// # Errors
    /// Returns an error if a site with this name is already registered
    pub fn new(stack: &Stack, name: &str, args: WebAppArgs) -> Result<Self, DeployError> {
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
