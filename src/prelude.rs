//! Commonly used types.

pub use crate::config::DeploymentConfig;
pub use crate::error::DeployError;
pub use crate::naming::ResourceNames;
pub use crate::output::Output;
pub use crate::program::{deploy, StackOutputs};
pub use crate::provider::memory::MemoryProvider;
pub use crate::provider::ResourceProvider;
pub use crate::resource::{Resource, ResourceKind, ResourceState};
pub use crate::stack::{Stack, StackState, StateStore, Urn};
