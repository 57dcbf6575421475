//! # Azure Resource Manager Provider
//!
//! Provisions resources through the ARM REST API.
//!
//! Every resource is addressed by its ARM id and the `api-version` of its
//! type. Create-or-update is a `PUT` of the desired body. When ARM accepts the
//! request asynchronously, the `Azure-AsyncOperation` (or `Location`) URL it
//! returns is polled first; the resource is then read with `GET` until
//! `properties.provisioningState` is terminal. Authentication is a bearer
//! token supplied by the caller.

mod operations;
mod responses;

use crate::config::{AccessToken, DeploymentConfig};
use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use responses::ArmErrorResponse;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use crate::constants::{DEFAULT_OPERATION_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS};

pub struct AzureResourceManager {
    http_client: Client,
    base_url: String,
    subscription_id: String,
    access_token: AccessToken,
    poll_interval: Duration,
    operation_timeout: Duration,
}

impl std::fmt::Debug for AzureResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureResourceManager")
            .field("base_url", &self.base_url)
            .field("subscription_id", &self.subscription_id)
            .finish_non_exhaustive()
    }
}

impl AzureResourceManager {
    /// Client for the subscription, endpoint and token of `config`
    ///
    /// # Errors
    /// Returns an error if the subscription id or access token is missing
    pub fn new(config: &DeploymentConfig) -> Result<Self> {
        let subscription_id = config
            .subscription_id
            .clone()
            .context("Subscription id is required (set subscriptionId or AZURE_SUBSCRIPTION_ID)")?;
        let access_token = config
            .access_token
            .clone()
            .context("Access token is required (set AZURE_ACCESS_TOKEN)")?;

        Ok(Self::with_endpoint(&config.arm_endpoint, subscription_id, access_token)?
            .with_polling(config.poll_interval(), config.operation_timeout()))
    }

    /// Client against an explicit ARM endpoint
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn with_endpoint(
        base_url: &str,
        subscription_id: impl Into<String>,
        access_token: AccessToken,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let subscription_id = subscription_id.into();
        info!(
            "Initializing Azure Resource Manager client for subscription {} at {}",
            subscription_id, base_url
        );

        // rustls is selected through the reqwest features
        let http_client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
            subscription_id,
            access_token,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        })
    }

    #[must_use]
    pub fn with_polling(mut self, poll_interval: Duration, operation_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.operation_timeout = operation_timeout;
        self
    }

    fn resource_url(&self, id: &str, api_version: &str) -> String {
        format!("{}{id}?api-version={api_version}", self.base_url)
    }

    fn action_url(&self, id: &str, action: &str, api_version: &str) -> String {
        format!("{}{id}/{action}?api-version={api_version}", self.base_url)
    }

    /// Resolve a URL returned in a response header against the endpoint
    ///
    /// ARM returns absolute URLs; relative ones are accepted as well.
    fn tracking_url(&self, location: &str) -> Result<Url> {
        Url::parse(&self.base_url)
            .and_then(|base| base.join(location))
            .with_context(|| format!("Invalid operation URL {location}"))
    }

    /// Build an authenticated request
    fn make_request(&self, method: Method, url: &str, body: Option<&Value>) -> RequestBuilder {
        let request = self
            .http_client
            .request(method, url)
            .bearer_auth(self.access_token.secret())
            .header("Content-Type", "application/json");

        match body {
            Some(body) => request.json(body),
            None => request,
        }
    }

    /// Turn an ARM error body into a descriptive error
    fn handle_error_response(status: StatusCode, error_text: &str) -> anyhow::Error {
        if let Ok(error_response) = serde_json::from_str::<ArmErrorResponse>(error_text) {
            anyhow!(
                "{}: {} (HTTP {})",
                error_response.error.code,
                error_response.error.message,
                status.as_u16()
            )
        } else {
            anyhow!("HTTP {} ({}): {}", status.as_u16(), status, error_text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AzureResourceManager {
        AzureResourceManager::with_endpoint(
            "https://management.example.com/",
            "sub-1",
            AccessToken::new("token"),
        )
        .unwrap()
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.resource_url("/subscriptions/sub-1/resourceGroups/rg", "2021-04-01"),
            "https://management.example.com/subscriptions/sub-1/resourceGroups/rg?api-version=2021-04-01"
        );
        assert_eq!(
            client.action_url("/x/storageAccounts/sa", "listKeys", "2023-01-01"),
            "https://management.example.com/x/storageAccounts/sa/listKeys?api-version=2023-01-01"
        );
    }

    #[test]
    fn test_tracking_urls() {
        let client = client();
        assert_eq!(
            client
                .tracking_url("https://management.azure.com/operations/op-1?api-version=2023-04-15")
                .unwrap()
                .as_str(),
            "https://management.azure.com/operations/op-1?api-version=2023-04-15"
        );
        assert_eq!(
            client.tracking_url("/operations/op-1").unwrap().as_str(),
            "https://management.example.com/operations/op-1"
        );
    }

    #[test]
    fn test_arm_error_codes_are_surfaced() {
        let error = AzureResourceManager::handle_error_response(
            StatusCode::FORBIDDEN,
            r#"{"error":{"code":"AuthorizationFailed","message":"No access"}}"#,
        );
        assert_eq!(error.to_string(), "AuthorizationFailed: No access (HTTP 403)");

        let error = AzureResourceManager::handle_error_response(StatusCode::BAD_GATEWAY, "upstream");
        assert!(error.to_string().starts_with("HTTP 502"));
    }

    #[test]
    fn test_new_requires_subscription_and_token() {
        let mut config = DeploymentConfig {
            project_name: "shop".to_string(),
            ..DeploymentConfig::default()
        };
        assert!(AzureResourceManager::new(&config).is_err());

        config.subscription_id = Some("sub-1".to_string());
        assert!(AzureResourceManager::new(&config).is_err());

        config.access_token = Some(AccessToken::new("very-secret-token"));
        let client = AzureResourceManager::new(&config).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("sub-1"));
        assert!(!debug.contains("very-secret-token"));
    }
}
