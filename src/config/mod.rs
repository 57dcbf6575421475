//! # Configuration
//!
//! Deployment settings, layered as defaults, then an optional YAML file,
//! then environment variables, then command-line flags.

mod deployment;

pub use deployment::{AccessToken, DeploymentConfig, LogFormat};
