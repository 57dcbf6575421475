//! # Errors
//!
//! Errors raised while declaring and realizing the stack.
//!
//! `DeployError` is `Clone` because a single failure is observed by every
//! output that depends on the failed value.

use crate::stack::Urn;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeployError {
    /// The provider rejected or failed to apply a resource
    #[error("Resource {urn} failed: {message}")]
    Provider { urn: Urn, message: String },

    /// Listing access keys for an account failed
    #[error("Listing keys for account {account} failed: {message}")]
    KeyListing { account: String, message: String },

    /// The provider-reported state lacks a field another resource reads
    #[error("Resource {urn} did not report output field {field}")]
    MissingOutput { urn: Urn, field: String },

    #[error("Resource {0} is registered more than once")]
    DuplicateResource(Urn),

    #[error("Storage account {0} returned no access keys")]
    NoStorageKeys(String),

    #[error("Dependency cycle detected involving {0}")]
    DependencyCycle(Urn),
}

impl DeployError {
    /// Wrap a provider error for the given resource, keeping the full context chain
    pub fn provider(urn: &Urn, error: &anyhow::Error) -> Self {
        Self::Provider {
            urn: urn.clone(),
            message: format!("{error:#}"),
        }
    }

    pub fn key_listing(account: &str, error: &anyhow::Error) -> Self {
        Self::KeyListing {
            account: account.to_string(),
            message: format!("{error:#}"),
        }
    }
}
