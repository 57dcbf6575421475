//! Infra Deployer Library
//!
//! Declares the application topology as desired-state records, wires the
//! outputs of one resource into the inputs of the next and realizes the
//! result through a [`provider::ResourceProvider`].
//! Tests are included in the module files and under `tests/`.

pub mod cli;
pub mod config;
pub mod connection_string;
pub mod constants;
pub mod error;
pub mod naming;
pub mod observability;
pub mod output;
pub mod prelude;
pub mod program;
pub mod provider;
pub mod resource;
pub mod runtime;
pub mod stack;
