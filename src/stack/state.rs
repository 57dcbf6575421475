//! # Stack State
//!
//! What a deployment leaves behind: the realized resources (for teardown)
//! and the exported outputs. Secret outputs are recorded without their value.

use crate::constants::SECRET_PLACEHOLDER;
use crate::stack::RealizedResource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// An exported stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub secret: bool,
}

impl OutputValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            secret: false,
        }
    }

    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            secret: true,
        }
    }

    /// Copy safe to write to disk
    #[must_use]
    pub fn redacted(&self) -> Self {
        if self.secret {
            Self {
                value: None,
                secret: true,
            }
        } else {
            self.clone()
        }
    }

    /// Text to print for this output
    #[must_use]
    pub fn display(&self, show_secrets: bool) -> &str {
        if self.secret && !show_secrets {
            return SECRET_PLACEHOLDER;
        }
        self.value.as_deref().unwrap_or(SECRET_PLACEHOLDER)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackState {
    pub project: String,
    pub environment: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub resources: Vec<RealizedResource>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputValue>,
}

impl StackState {
    pub fn new(project: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            updated_at: Utc::now(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Key under which the state is stored
    #[must_use]
    pub fn stack_name(&self) -> String {
        stack_name(&self.project, &self.environment)
    }

    /// Merge resources realized by a run; a resource seen again replaces its old record
    pub fn record_resources(&mut self, realized: impl IntoIterator<Item = RealizedResource>) {
        for resource in realized {
            match self
                .resources
                .iter_mut()
                .find(|existing| existing.urn == resource.urn)
            {
                Some(existing) => *existing = resource,
                None => self.resources.push(resource),
            }
        }
        self.updated_at = Utc::now();
    }

    /// Copy with every secret output value removed
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            outputs: self
                .outputs
                .iter()
                .map(|(name, value)| (name.clone(), value.redacted()))
                .collect(),
            ..self.clone()
        }
    }
}

/// `{project}/{environment}`
///
/// Neither part may contain `/`, so distinct pairs never share a name even
/// when the parts themselves contain hyphens.
#[must_use]
pub fn stack_name(project: &str, environment: &str) -> String {
    format!("{project}/{environment}")
}

/// Persistence for stack state, keyed by stack name
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the state of a stack. Returns `None` if it was never deployed.
    async fn load(&self, stack: &str) -> Result<Option<StackState>>;

    /// Save the state of a stack, replacing any previous state.
    /// Secret output values are dropped before writing.
    async fn save(&self, state: &StackState) -> Result<()>;

    /// Remove the state of a stack. Idempotent.
    async fn delete(&self, stack: &str) -> Result<()>;
}

/// One JSON file per stack, at `{dir}/{project}/{environment}.json`
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, stack: &str) -> PathBuf {
        self.dir.join(format!("{stack}.json"))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, stack: &str) -> Result<Option<StackState>> {
        let path = self.path_for(stack);
        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read state file {}", path.display()))
            }
        };

        let state = serde_json::from_slice(&contents)
            .with_context(|| format!("Failed to parse state file {}", path.display()))?;
        Ok(Some(state))
    }

    async fn save(&self, state: &StackState) -> Result<()> {
        let path = self.path_for(&state.stack_name());
        let parent = path.parent().unwrap_or(&self.dir);
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create state directory {}", parent.display()))?;

        let contents = serde_json::to_vec_pretty(&state.redacted())?;
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write state file {}", path.display()))?;

        debug!(path = %path.display(), resources = state.resources.len(), "Saved stack state");
        Ok(())
    }

    async fn delete(&self, stack: &str) -> Result<()> {
        let path = self.path_for(stack);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove state file {}", path.display())),
        }
    }
}

/// Process-local state, used by tests and previews
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<String, StackState>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, stack: &str) -> Result<Option<StackState>> {
        Ok(self.states.lock().await.get(stack).cloned())
    }

    async fn save(&self, state: &StackState) -> Result<()> {
        self.states
            .lock()
            .await
            .insert(state.stack_name(), state.redacted());
        Ok(())
    }

    async fn delete(&self, stack: &str) -> Result<()> {
        self.states.lock().await.remove(stack);
        Ok(())
    }
}
