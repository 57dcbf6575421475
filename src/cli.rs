//! # CLI
//!
//! Command-line interface of the deployer.
//!
//! ## Usage
//!
//! ```bash
//! # Show the records that would be submitted
//! infra-deployer --project shop --stack dev preview
//!
//! # Provision (needs AZURE_SUBSCRIPTION_ID and AZURE_ACCESS_TOKEN)
//! infra-deployer --project shop --stack dev up
//!
//! # Print recorded outputs
//! infra-deployer --project shop --stack dev outputs --show-secrets
//!
//! # Tear everything down
//! infra-deployer --project shop --stack dev destroy
//! ```

use crate::config::DeploymentConfig;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Provision the web application topology on Azure
#[derive(Debug, Parser)]
#[command(name = "infra-deployer", version)]
#[command(
    about = "Provision the web application topology on Azure",
    long_about = None,
    after_help = "\
Configuration is read from --config (YAML), then INFRA_* / AZURE_* environment
variables, then the flags below.

Examples:
  infra-deployer --project shop --stack dev preview --format yaml
  infra-deployer --config infra.yaml up
  infra-deployer --project shop --stack dev outputs
"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project name
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Stack (environment) name, e.g. dev or prod
    #[arg(short, long, global = true)]
    pub stack: Option<String>,

    /// Azure region of the resource group
    #[arg(short, long, global = true)]
    pub location: Option<String>,

    /// Directory holding stack state files
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the desired state of every resource without provisioning anything
    Preview {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Create or update every resource and record the stack state
    Up {
        /// Print secret outputs in clear text
        #[arg(long)]
        show_secrets: bool,
    },
    /// Delete every recorded resource in reverse dependency order
    Destroy,
    /// Print the outputs recorded by the last `up`
    Outputs {
        /// Print secret outputs in clear text when they are available
        #[arg(long)]
        show_secrets: bool,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl Cli {
    /// Overlay the global flags on a loaded configuration
    pub fn apply_to(&self, config: &mut DeploymentConfig) {
        if let Some(project) = &self.project {
            config.project_name.clone_from(project);
        }
        if let Some(stack) = &self.stack {
            config.environment.clone_from(stack);
        }
        if let Some(location) = &self.location {
            config.location.clone_from(location);
        }
        if let Some(state_dir) = &self.state_dir {
            config.state_dir.clone_from(state_dir);
        }
    }
}
