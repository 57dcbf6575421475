//! # Storage Connection String
//!
//! Builds the connection string the functions app uses for its host storage
//! from the primary access key of the storage account.

use crate::error::DeployError;
use crate::output::Output;
use crate::resource::storage::list_storage_account_keys;
use crate::stack::Stack;

/// `DefaultEndpointsProtocol=https;AccountName=<name>;AccountKey=<key>`
#[must_use]
pub fn format_connection_string(account_name: &str, account_key: &str) -> String {
    format!("DefaultEndpointsProtocol=https;AccountName={account_name};AccountKey={account_key}")
}

/// Connection string of a storage account, known once its keys are listed
///
/// Uses the first key the provider returns. The result is secret.
#[must_use]
pub fn get_connection_string(
    stack: &Stack,
    resource_group_name: &Output<String>,
    account_name: &Output<String>,
) -> Output<String> {
    list_storage_account_keys(stack, resource_group_name, account_name)
        .zip(account_name)
        .try_apply(|(keys, account_name)| {
            let primary = keys
                .first()
                .ok_or_else(|| DeployError::NoStorageKeys(account_name.clone()))?;
            Ok(format_connection_string(&account_name, &primary.value))
        })
        .into_secret()
}
