//! # Runtime
//!
//! Process start-up and the CLI commands.
//!
//! - `initialization`: rustls, `.env`, configuration layering, tracing
//! - `commands`: preview, up, destroy, outputs, schema

pub mod commands;
pub mod initialization;

pub use commands::execute;
pub use initialization::{initialize, install_crypto_provider};
