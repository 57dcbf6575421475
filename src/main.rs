//! # Infra Deployer
//!
//! Declares the web application topology (resource group, storage,
//! Application Insights, App Service plan, Cosmos DB, web and functions
//! apps) and provisions it through Azure Resource Manager.
//!
//! See `infra-deployer --help` for the commands.

use anyhow::Result;
use clap::Parser;
use infra_deployer::cli::Cli;
use infra_deployer::runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = runtime::initialize(&cli)?;
    runtime::execute(cli.command, config).await
}
