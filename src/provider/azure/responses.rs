//! ARM response payloads.

use crate::provider::StorageAccountKey;
use serde::Deserialize;
use serde_json::Value;

/// Error envelope returned by every ARM endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ArmErrorResponse {
    pub(crate) error: ArmError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArmError {
    /// Machine-readable code (e.g. `ResourceGroupNotFound`, `AuthorizationFailed`)
    pub(crate) code: String,
    pub(crate) message: String,
}

/// Response of `storageAccounts/{name}/listKeys`
#[derive(Debug, Deserialize)]
pub(crate) struct StorageAccountListKeysResult {
    #[serde(default)]
    pub(crate) keys: Vec<StorageAccountKey>,
}

/// Body returned by an `Azure-AsyncOperation` status URL
#[derive(Debug, Deserialize)]
pub(crate) struct AsyncOperationStatus {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) error: Option<ArmError>,
}

impl AsyncOperationStatus {
    pub(crate) fn state(&self) -> ProvisioningState {
        ProvisioningState::from_status(&self.status)
    }
}

/// Where a resource is in its provisioning lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ProvisioningState {
    Succeeded,
    Failed(String),
    InProgress(String),
}

impl ProvisioningState {
    /// Read `properties.provisioningState`; resources that do not report one are done
    pub(crate) fn of(resource: &Value) -> Self {
        resource
            .pointer("/properties/provisioningState")
            .and_then(Value::as_str)
            .map_or(Self::Succeeded, Self::from_status)
    }

    /// Classify a provisioning state or async operation status
    pub(crate) fn from_status(status: &str) -> Self {
        if status.eq_ignore_ascii_case("Succeeded") {
            Self::Succeeded
        } else if status.eq_ignore_ascii_case("Failed") || status.eq_ignore_ascii_case("Canceled") {
            Self::Failed(status.to_string())
        } else {
            Self::InProgress(status.to_string())
        }
    }
}
