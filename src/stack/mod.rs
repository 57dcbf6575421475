//! # Stack
//!
//! A stack is one deployment instance (project + environment) of the
//! topology. Resources are registered with the stack as they are declared;
//! registration only records the desired state and its dependencies.
//! Realization is driven by [`Stack::run`], which lets every resource
//! proceed as soon as the outputs it reads have resolved, so creation order
//! follows data dependencies rather than declaration order.

mod graph;
mod state;

pub use graph::DependencyGraph;
pub use state::{stack_name, FileStateStore, MemoryStateStore, OutputValue, StackState, StateStore};

use crate::error::DeployError;
use crate::output::Output;
use crate::provider::ResourceProvider;
use crate::resource::{DesiredState, Resource, ResourceKind, ResourceState};
use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, info_span, Instrument};

/// Unique name of a registered resource within all stacks
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(String);

impl Urn {
    #[must_use]
    pub fn new(environment: &str, project: &str, kind: ResourceKind, name: &str) -> Self {
        Self(format!(
            "urn:infra:{environment}::{project}::{}::{name}",
            kind.arm_type()
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Logical name the resource was registered under
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resource that the provider has created or updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedResource {
    pub urn: Urn,
    pub kind: ResourceKind,
    /// ARM resource id
    pub id: String,
    /// Resources whose outputs this one consumed
    pub dependencies: Vec<Urn>,
}

/// A resolved desired state, as shown by `preview`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedResource {
    pub urn: Urn,
    pub kind: ResourceKind,
    pub id: String,
    pub dependencies: Vec<Urn>,
    pub body: Value,
}

/// Outcome of realizing every registered resource
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Resources in completion order
    pub realized: Vec<RealizedResource>,
    /// Distinct failures; dependents of a failed resource report the same error
    pub errors: Vec<DeployError>,
}

impl RunSummary {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first failure, if any
    ///
    /// # Errors
    /// Returns the first distinct failure recorded during the run
    pub fn into_result(self) -> Result<Vec<RealizedResource>, DeployError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.realized),
        }
    }
}

struct Registration {
    urn: Urn,
    kind: ResourceKind,
    dependencies: BTreeSet<Urn>,
    desired: Output<DesiredState>,
    realized: Output<RealizedResource>,
}

pub struct Stack {
    project: String,
    environment: String,
    provider: Arc<dyn ResourceProvider>,
    registrations: Mutex<Vec<Registration>>,
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("project", &self.project)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl Stack {
    pub fn new(
        project: impl Into<String>,
        environment: impl Into<String>,
        provider: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            provider,
            registrations: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[must_use]
    pub fn provider(&self) -> Arc<dyn ResourceProvider> {
        Arc::clone(&self.provider)
    }

    /// URNs in registration order
    #[must_use]
    pub fn urns(&self) -> Vec<Urn> {
        self.lock_registrations()
            .iter()
            .map(|registration| registration.urn.clone())
            .collect()
    }

    fn lock_registrations(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a resource under a logical name
    ///
    /// Nothing is sent to the provider here; the returned state resolves once
    /// the resource has been realized.
    ///
    /// # Errors
    /// Returns `DuplicateResource` if the same kind and name were registered before
    pub fn register<R: Resource>(&self, name: &str, resource: &R) -> Result<ResourceState, DeployError> {
        let kind = resource.kind();
        let urn = Urn::new(&self.environment, &self.project, kind, name);

        let mut registrations = self.lock_registrations();
        if registrations.iter().any(|existing| existing.urn == urn) {
            return Err(DeployError::DuplicateResource(urn));
        }

        let desired = resource.desired_state();
        let dependencies = desired.dependencies().clone();
        debug!(
            urn = %urn,
            kind = %kind,
            dependencies = dependencies.len(),
            "Registered resource"
        );

        let state = self.realize(urn.clone(), desired.clone());
        let realized = {
            let urn = urn.clone();
            let dependencies: Vec<Urn> = dependencies.iter().cloned().collect();
            state.try_apply(move |state| {
                let id = state
                    .get("id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| DeployError::MissingOutput {
                        urn: urn.clone(),
                        field: "/id".to_string(),
                    })?;
                Ok(RealizedResource {
                    urn,
                    kind,
                    id,
                    dependencies,
                })
            })
        };

        registrations.push(Registration {
            urn: urn.clone(),
            kind,
            dependencies,
            desired,
            realized,
        });

        Ok(ResourceState::new(urn, kind, state))
    }

    fn realize(&self, urn: Urn, desired: Output<DesiredState>) -> Output<Value> {
        let provider = Arc::clone(&self.provider);
        let secret = desired.is_secret();
        let dependencies = BTreeSet::from([urn.clone()]);

        Output::from_future(dependencies, async move {
            let desired = desired.resolve().await?;
            let span = info_span!("stack.resource.apply", urn = %urn, kind = %desired.kind);

            async move {
                info!(resource = desired.path.name(), "Creating or updating resource");
                if !secret {
                    debug!(body = %desired.body, "Desired state");
                }
                match provider.create_or_update(&desired).await {
                    Ok(state) => {
                        info!(resource = desired.path.name(), "Resource ready");
                        Ok(state)
                    }
                    Err(e) => {
                        error!(resource = desired.path.name(), "Resource failed: {e:#}");
                        Err(DeployError::provider(&urn, &e))
                    }
                }
            }
            .instrument(span)
            .await
        })
    }

    /// Realize every registered resource
    ///
    /// Independent resources proceed concurrently. A failure does not stop
    /// unrelated resources; dependents of the failed resource fail with the
    /// same error. Resources created before a failure stay in place.
    pub async fn run(&self) -> RunSummary {
        let pending: Vec<Output<RealizedResource>> = self
            .lock_registrations()
            .iter()
            .map(|registration| registration.realized.clone())
            .collect();

        info!(
            project = %self.project,
            environment = %self.environment,
            resources = pending.len(),
            "Realizing stack"
        );

        let mut in_flight: FuturesUnordered<_> = pending
            .into_iter()
            .map(|output| async move { output.resolve().await })
            .collect();

        let mut summary = RunSummary::default();
        while let Some(result) = in_flight.next().await {
            match result {
                Ok(resource) => summary.realized.push(resource),
                Err(e) => {
                    if !summary.errors.contains(&e) {
                        summary.errors.push(e);
                    }
                }
            }
        }
        summary
    }

    /// Resolve every desired state without recording anything
    ///
    /// Upstream resources are still realized against the provider, because
    /// downstream records read their outputs; use an in-memory provider to
    /// preview without side effects.
    ///
    /// # Errors
    /// Returns the first resolution failure
    pub async fn plan(&self) -> Result<Vec<PlannedResource>, DeployError> {
        let subscription_id = self.provider.subscription_id().to_string();
        let pending: Vec<(Urn, ResourceKind, Vec<Urn>, Output<DesiredState>)> = self
            .lock_registrations()
            .iter()
            .map(|registration| {
                (
                    registration.urn.clone(),
                    registration.kind,
                    registration.dependencies.iter().cloned().collect(),
                    registration.desired.clone(),
                )
            })
            .collect();

        let planned = pending
            .into_iter()
            .map(|(urn, kind, dependencies, desired)| {
                let subscription_id = subscription_id.clone();
                async move {
                    let desired = desired.resolve().await?;
                    Ok::<_, DeployError>(PlannedResource {
                        urn,
                        kind,
                        id: desired.path.to_id(&subscription_id),
                        dependencies,
                        body: desired.body,
                    })
                }
            });

        futures::future::try_join_all(planned).await
    }
}

/// Delete the resources recorded in `state` in reverse dependency order
///
/// Each deleted resource is removed from `state` immediately, so a failed
/// teardown leaves `state` describing exactly what still exists.
///
/// # Errors
/// Returns an error on a dependency cycle or the first failed deletion
pub async fn destroy(provider: &dyn ResourceProvider, state: &mut StackState) -> Result<Vec<Urn>> {
    let order: Vec<RealizedResource> = DependencyGraph::new(&state.resources)
        .destroy_order()?
        .into_iter()
        .cloned()
        .collect();

    let mut deleted = Vec::with_capacity(order.len());
    for resource in order {
        let span = info_span!("stack.resource.delete", urn = %resource.urn, kind = %resource.kind);
        async {
            info!(id = %resource.id, "Deleting resource");
            provider
                .delete(resource.kind, &resource.id)
                .await
                .with_context(|| format!("Failed to delete {}", resource.urn))
        }
        .instrument(span)
        .await?;

        state.resources.retain(|existing| existing.urn != resource.urn);
        deleted.push(resource.urn);
    }

    Ok(deleted)
}
