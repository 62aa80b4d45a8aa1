use crate::delegation_sas::UserDelegationSas;
use crate::permissions::{
    ACCOUNT_PERMISSIONS, ACCOUNT_SAS_RESOURCE_TYPES, ACCOUNT_SAS_SERVICES, BLOB_PERMISSIONS,
    CONTAINER_PERMISSIONS,
};
use crate::{BlobPath, BlobServiceClient, ClientRegistry, DelegationKeyIssuer, ExpiryWindow, Identity};
use log::debug;
use sasvend_core::time::{now, DateTime};
use sasvend_core::{Error, ProvideCredential, Result};
use std::sync::Arc;
use std::time::Duration;

/// Issues SAS tokens for paths in Azure Blob Storage.
///
/// Every token expires at `now + min(duration, 7 days)`. Permissions always
/// come from the published constants of [`crate::permissions`].
#[derive(Debug, Clone)]
pub struct SasSigner {
    registry: Arc<ClientRegistry>,
    credential: Arc<dyn ProvideCredential<Credential = Identity>>,
    issuer: DelegationKeyIssuer,
    time: Option<DateTime>,
}

impl SasSigner {
    /// Create a signer. `credential` provides the ambient identity used for
    /// path based requests.
    pub fn new(
        registry: Arc<ClientRegistry>,
        credential: Arc<dyn ProvideCredential<Credential = Identity>>,
    ) -> Self {
        Self {
            issuer: DelegationKeyIssuer::new(registry.clone(), credential.clone()),
            registry,
            credential,
            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign tokens.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self.issuer = self.issuer.with_time(time);
        self
    }

    /// Container SAS signed with a fresh user delegation key.
    ///
    /// The token carries the blob and container permission sets and is valid
    /// for every blob in the container of `path`.
    pub async fn container_sas_via_delegation(
        &self,
        path: &BlobPath,
        duration: Duration,
    ) -> Result<String> {
        check_duration(duration)?;

        let key = self.issuer.issue(path, duration).await?;
        let window = self.window(duration);

        debug!(
            "signing container SAS for {}/{} until {}",
            path.account(),
            path.container(),
            window.expiry()
        );
        UserDelegationSas::new(path, &key, window)
            .with_permissions(&[BLOB_PERMISSIONS, CONTAINER_PERMISSIONS])
            .token_string()
    }

    /// Account SAS signed with the ambient shared key of the path's account.
    pub async fn account_sas_via_key(&self, path: &BlobPath, duration: Duration) -> Result<String> {
        check_duration(duration)?;

        let client = self
            .registry
            .ambient(self.credential.as_ref(), path.account())
            .await?;
        self.account_sas(&client, duration)
    }

    /// Account SAS signed with an explicit account key.
    pub async fn account_sas_via_key_for(
        &self,
        account_name: &str,
        account_key: &str,
        duration: Duration,
    ) -> Result<String> {
        check_duration(duration)?;

        let client = self.registry.shared_key(account_name, account_key).await?;
        self.account_sas(&client, duration)
    }

    fn account_sas(&self, client: &BlobServiceClient, duration: Duration) -> Result<String> {
        let window = self.window(duration);

        debug!(
            "signing account SAS for {} until {}",
            client.account_name(),
            window.expiry()
        );
        client.account_sas(
            &window,
            ACCOUNT_PERMISSIONS,
            ACCOUNT_SAS_SERVICES,
            ACCOUNT_SAS_RESOURCE_TYPES,
        )
    }

    fn window(&self, duration: Duration) -> ExpiryWindow {
        ExpiryWindow::compute(duration, self.time.unwrap_or_else(now))
    }
}

fn check_duration(duration: Duration) -> Result<()> {
    if duration.is_zero() {
        return Err(Error::request_invalid("SAS lifetime must be positive"));
    }
    Ok(())
}
