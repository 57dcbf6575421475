//! # Azure Resource Manager Operations
//!
//! Implements the `ResourceProvider` trait against the ARM REST API.

use super::responses::{AsyncOperationStatus, ProvisioningState, StorageAccountListKeysResult};
use super::AzureResourceManager;
use crate::provider::{DatabaseAccountKeys, ResourceProvider, StorageAccountKey};
use crate::resource::{DesiredState, ResourceKind, ResourcePath};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Where ARM reports the progress of an accepted request
#[derive(Debug)]
enum Tracking {
    AsyncOperation(Url),
    Location(Url),
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

impl AzureResourceManager {
    async fn get_resource(&self, id: &str, kind: ResourceKind) -> Result<Option<Value>> {
        let url = self.resource_url(id, kind.api_version());
        let response = self
            .make_request(Method::GET, &url, None)
            .send()
            .await
            .with_context(|| format!("Failed to read resource {id}"))?;

        match response.status() {
            status if status.is_success() => {
                let resource = response
                    .json()
                    .await
                    .with_context(|| format!("Failed to parse resource {id}"))?;
                Ok(Some(resource))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                let error_text = response.text().await.unwrap_or_default();
                Err(Self::handle_error_response(status, &error_text))
            }
        }
    }

    /// Read the resource until its provisioning state is terminal
    ///
    /// A resource that is not visible yet (404) is still being created.
    async fn poll_provisioning(&self, id: &str, kind: ResourceKind, mut resource: Option<Value>) -> Result<Value> {
        loop {
            match resource.as_ref().map(ProvisioningState::of) {
                Some(ProvisioningState::Succeeded) => {
                    return resource.with_context(|| format!("Resource {id} has no state"));
                }
                Some(ProvisioningState::Failed(state)) => {
                    bail!("Provisioning of {id} ended in state {state}")
                }
                Some(ProvisioningState::InProgress(state)) => {
                    debug!(state = %state, "Waiting for provisioning");
                }
                None => debug!("Waiting for resource to become visible"),
            }
            tokio::time::sleep(self.poll_interval).await;
            resource = self.get_resource(id, kind).await?;
        }
    }

    /// Poll an `Azure-AsyncOperation` URL until the operation is terminal
    async fn poll_async_operation(&self, url: &Url) -> Result<()> {
        loop {
            let response = self
                .make_request(Method::GET, url.as_str(), None)
                .send()
                .await
                .with_context(|| format!("Failed to read operation status {url}"))?;
            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(Self::handle_error_response(status, &error_text));
            }

            let operation: AsyncOperationStatus = response
                .json()
                .await
                .context("Failed to parse operation status")?;
            match operation.state() {
                ProvisioningState::Succeeded => return Ok(()),
                ProvisioningState::Failed(state) => match operation.error {
                    Some(error) => bail!("Operation {state}: {}: {}", error.code, error.message),
                    None => bail!("Operation {state}"),
                },
                ProvisioningState::InProgress(state) => {
                    debug!(state = %state, "Waiting for asynchronous operation");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// Poll a `Location` URL until it stops answering 202
    async fn poll_location(&self, url: &Url) -> Result<()> {
        loop {
            let response = self
                .make_request(Method::GET, url.as_str(), None)
                .send()
                .await
                .with_context(|| format!("Failed to read operation result {url}"))?;
            match response.status() {
                StatusCode::ACCEPTED => {
                    debug!("Waiting for asynchronous operation");
                    tokio::time::sleep(self.poll_interval).await;
                }
                status if status.is_success() => return Ok(()),
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    return Err(Self::handle_error_response(status, &error_text));
                }
            }
        }
    }

    async fn settle(
        &self,
        id: &str,
        kind: ResourceKind,
        tracking: Option<Tracking>,
        resource: Option<Value>,
    ) -> Result<Value> {
        match tracking {
            Some(Tracking::AsyncOperation(url)) => self.poll_async_operation(&url).await?,
            Some(Tracking::Location(url)) => self.poll_location(&url).await?,
            None => {}
        }
        self.poll_provisioning(id, kind, resource).await
    }

    /// Wait for an accepted PUT to finish or the operation to time out
    async fn wait_for_provisioning(
        &self,
        id: &str,
        kind: ResourceKind,
        tracking: Option<Tracking>,
        resource: Option<Value>,
    ) -> Result<Value> {
        tokio::time::timeout(self.operation_timeout, self.settle(id, kind, tracking, resource))
            .await
            .with_context(|| {
                format!(
                    "Timed out after {}s waiting for {id} to provision",
                    self.operation_timeout.as_secs()
                )
            })?
    }

    /// Progress URL of an asynchronous request, if ARM returned one
    fn tracking(&self, status: StatusCode, headers: &HeaderMap) -> Result<Option<Tracking>> {
        if let Some(url) = header_value(headers, "azure-asyncoperation") {
            return Ok(Some(Tracking::AsyncOperation(self.tracking_url(url)?)));
        }
        if status == StatusCode::ACCEPTED {
            if let Some(url) = header_value(headers, "location") {
                return Ok(Some(Tracking::Location(self.tracking_url(url)?)));
            }
        }
        Ok(None)
    }

    async fn poll_deletion(&self, id: &str, kind: ResourceKind) -> Result<()> {
        while self.get_resource(id, kind).await?.is_some() {
            debug!("Waiting for deletion");
            tokio::time::sleep(self.poll_interval).await;
        }
        Ok(())
    }

    /// Poll until the resource is gone or the operation times out
    async fn wait_for_deletion(&self, id: &str, kind: ResourceKind) -> Result<()> {
        tokio::time::timeout(self.operation_timeout, self.poll_deletion(id, kind))
            .await
            .with_context(|| {
                format!(
                    "Timed out after {}s waiting for {id} to be deleted",
                    self.operation_timeout.as_secs()
                )
            })?
    }

    async fn post_action(&self, id: &str, action: &str, kind: ResourceKind) -> Result<reqwest::Response> {
        let url = self.action_url(id, action, kind.api_version());
        let response = self
            .make_request(Method::POST, &url, None)
            .send()
            .await
            .with_context(|| format!("Failed to call {action} on {id}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &error_text))
                .with_context(|| format!("{action} on {id} failed"));
        }
        Ok(response)
    }
}

#[async_trait]
impl ResourceProvider for AzureResourceManager {
    fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    async fn create_or_update(&self, desired: &DesiredState) -> Result<Value> {
        let id = desired.path.to_id(&self.subscription_id);
        let span = info_span!(
            "azure.arm.resource.put",
            resource.id = %id,
            resource.kind = %desired.kind,
            operation.duration_ms = tracing::field::Empty
        );
        let span_clone = span.clone();
        let start = Instant::now();

        async move {
            let url = self.resource_url(&id, desired.kind.api_version());
            let response = self
                .make_request(Method::PUT, &url, Some(&desired.body))
                .send()
                .await
                .with_context(|| format!("Failed to send PUT for {id}"))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(Self::handle_error_response(status, &error_text))
                    .with_context(|| format!("PUT {id} was rejected"));
            }

            let tracking = self.tracking(status, response.headers())?;
            // 202 carries no resource body; it is read back once the operation is done
            let accepted = if status == StatusCode::ACCEPTED {
                None
            } else {
                Some(
                    response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse PUT response for {id}"))?,
                )
            };

            let resource = self
                .wait_for_provisioning(&id, desired.kind, tracking, accepted)
                .await?;
            span_clone.record("operation.duration_ms", start.elapsed().as_millis() as u64);
            info!("Provisioned {}", desired.path.name());
            Ok(resource)
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()> {
        let span = info_span!("azure.arm.resource.delete", resource.id = %id, resource.kind = %kind);

        async move {
            let url = self.resource_url(id, kind.api_version());
            let response = self
                .make_request(Method::DELETE, &url, None)
                .send()
                .await
                .with_context(|| format!("Failed to send DELETE for {id}"))?;

            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => {
                    info!("Deleted {id}");
                    Ok(())
                }
                StatusCode::NOT_FOUND => {
                    debug!("{id} was already gone");
                    Ok(())
                }
                StatusCode::ACCEPTED => {
                    self.wait_for_deletion(id, kind).await?;
                    info!("Deleted {id}");
                    Ok(())
                }
                status => {
                    let error_text = response.text().await.unwrap_or_default();
                    Err(Self::handle_error_response(status, &error_text))
                        .with_context(|| format!("DELETE {id} was rejected"))
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn list_storage_account_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<Vec<StorageAccountKey>> {
        let id = ResourcePath::provider(resource_group, "Microsoft.Storage", "storageAccounts", account_name)
            .to_id(&self.subscription_id);
        let span = info_span!("azure.arm.storage.list_keys", account.name = account_name);

        async move {
            let result: StorageAccountListKeysResult = self
                .post_action(&id, "listKeys", ResourceKind::StorageAccount)
                .await?
                .json()
                .await
                .context("Failed to parse storage account keys")?;
            debug!(keys = result.keys.len(), "Listed storage account keys");
            Ok(result.keys)
        }
        .instrument(span)
        .await
    }

    async fn list_database_account_keys(
        &self,
        resource_group: &str,
        account_name: &str,
    ) -> Result<DatabaseAccountKeys> {
        let id = ResourcePath::provider(resource_group, "Microsoft.DocumentDB", "databaseAccounts", account_name)
            .to_id(&self.subscription_id);
        let span = info_span!("azure.arm.documentdb.list_keys", account.name = account_name);

        async move {
            self.post_action(&id, "listKeys", ResourceKind::DatabaseAccount)
                .await?
                .json()
                .await
                .context("Failed to parse database account keys")
        }
        .instrument(span)
        .await
    }
}
