//! # Commands
//!
//! The `preview`, `up`, `destroy`, `outputs` and `schema` commands. Each
//! command takes its provider and state store as arguments so the same code
//! runs against Azure and against the in-memory implementations.

use crate::cli::{Commands, OutputFormat};
use crate::config::DeploymentConfig;
use crate::provider::azure::AzureResourceManager;
use crate::provider::memory::MemoryProvider;
use crate::provider::ResourceProvider;
use crate::stack::{
    destroy as destroy_resources, FileStateStore, OutputValue, PlannedResource, Stack, StackState,
    StateStore, Urn,
};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run one CLI command with the effective configuration
///
/// # Errors
/// Returns the failure of the command
pub async fn execute(command: Commands, config: DeploymentConfig) -> Result<()> {
    match command {
        Commands::Preview { format } => {
            let planned = preview(&config).await?;
            print!("{}", render_plan(&planned, format)?);
        }
        Commands::Up { show_secrets } => {
            let provider: Arc<dyn ResourceProvider> = Arc::new(AzureResourceManager::new(&config)?);
            let store = FileStateStore::new(&config.state_dir);
            let state = up(provider, &store, &config).await?;
            print!("{}", render_outputs(&state.outputs, show_secrets));
        }
        Commands::Destroy => {
            let provider = AzureResourceManager::new(&config)?;
            let store = FileStateStore::new(&config.state_dir);
            let deleted = destroy(&provider, &store, &config).await?;
            println!("Deleted {} resources", deleted.len());
        }
        Commands::Outputs { show_secrets } => {
            let store = FileStateStore::new(&config.state_dir);
            let outputs = outputs(&store, &config).await?;
            print!("{}", render_outputs(&outputs, show_secrets));
        }
        Commands::Schema => println!("{}", schema()?),
    }
    Ok(())
}

/// Resolve every desired state against the preview provider
///
/// Values only the cloud can produce are shown as `[unknown]`.
///
/// # Errors
/// Returns an error if the configuration is incomplete or a record cannot be resolved
pub async fn preview(config: &DeploymentConfig) -> Result<Vec<PlannedResource>> {
    config.validate()?;

    let mut provider = MemoryProvider::preview();
    if let Some(subscription_id) = &config.subscription_id {
        provider = provider.with_subscription(subscription_id.clone());
    }
    let stack = Stack::new(
        &config.project_name,
        &config.environment,
        Arc::new(provider) as Arc<dyn ResourceProvider>,
    );
    crate::program::deploy(&stack, config)?;

    info!(stack = %config.stack_name(), "Previewing stack");
    Ok(stack.plan().await?)
}

/// Provision the stack and record what was created
///
/// State is saved even when some resources fail, so everything that was
/// created can still be destroyed.
///
/// # Errors
/// Returns an error if any resource fails or the state cannot be saved
pub async fn up(
    provider: Arc<dyn ResourceProvider>,
    store: &dyn StateStore,
    config: &DeploymentConfig,
) -> Result<StackState> {
    config.validate()?;
    let stack_name = config.stack_name();

    let stack = Stack::new(&config.project_name, &config.environment, provider);
    let outputs = crate::program::deploy(&stack, config)?;

    info!(stack = %stack_name, resources = stack.urns().len(), "Updating stack");
    let summary = stack.run().await;

    let mut state = store
        .load(&stack_name)
        .await?
        .unwrap_or_else(|| StackState::new(&config.project_name, &config.environment));
    let succeeded = summary.is_success();
    state.record_resources(summary.realized);
    // Record what exists before anything else can fail
    store.save(&state).await?;

    if !succeeded {
        for e in &summary.errors {
            error!("{e}");
        }
        bail!(
            "Update of stack {stack_name} failed with {} error(s); {} resource(s) recorded in state",
            summary.errors.len(),
            state.resources.len()
        );
    }

    // The store redacts secrets; the returned state keeps them for printing
    state.outputs = outputs
        .resolve()
        .await
        .with_context(|| format!("Failed to resolve outputs of stack {stack_name}"))?;
    store.save(&state).await?;
    info!(stack = %stack_name, "Stack is up to date");
    Ok(state)
}

/// Delete every recorded resource and then the state itself
///
/// # Errors
/// Returns an error if a deletion fails; the state then lists what remains
pub async fn destroy(
    provider: &dyn ResourceProvider,
    store: &dyn StateStore,
    config: &DeploymentConfig,
) -> Result<Vec<Urn>> {
    config.validate()?;
    let stack_name = config.stack_name();

    let Some(mut state) = store.load(&stack_name).await? else {
        warn!(stack = %stack_name, "No state recorded, nothing to destroy");
        return Ok(Vec::new());
    };

    info!(stack = %stack_name, resources = state.resources.len(), "Destroying stack");
    match destroy_resources(provider, &mut state).await {
        Ok(deleted) => {
            store.delete(&stack_name).await?;
            info!(stack = %stack_name, "Stack destroyed");
            Ok(deleted)
        }
        Err(e) => {
            store
                .save(&state)
                .await
                .context("Failed to record the remaining resources")?;
            Err(e)
        }
    }
}

/// Outputs recorded by the last successful `up`
///
/// # Errors
/// Returns an error if the stack was never deployed
pub async fn outputs(
    store: &dyn StateStore,
    config: &DeploymentConfig,
) -> Result<BTreeMap<String, OutputValue>> {
    config.validate()?;
    let stack_name = config.stack_name();
    let state = store
        .load(&stack_name)
        .await?
        .with_context(|| format!("Stack {stack_name} has no recorded state"))?;
    Ok(state.outputs)
}

/// JSON schema of the configuration file
///
/// # Errors
/// Returns an error if the schema cannot be serialized
pub fn schema() -> Result<String> {
    let schema = schemars::schema_for!(DeploymentConfig);
    serde_json::to_string_pretty(&schema).context("Failed to serialize configuration schema")
}

/// # Errors
/// Returns an error if the records cannot be serialized
pub fn render_plan(planned: &[PlannedResource], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(planned)
            .map(|json| json + "\n")
            .context("Failed to render plan as JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(planned).context("Failed to render plan as YAML"),
    }
}

#[must_use]
pub fn render_outputs(outputs: &BTreeMap<String, OutputValue>, show_secrets: bool) -> String {
    let mut rendered = String::new();
    for (name, value) in outputs {
        let _ = writeln!(rendered, "{name}: {}", value.display(show_secrets));
    }
    rendered
}
