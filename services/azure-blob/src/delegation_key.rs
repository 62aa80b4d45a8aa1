use crate::{BlobPath, ClientRegistry, ExpiryWindow, Identity};
use log::debug;
use sasvend_core::time::{now, DateTime};
use sasvend_core::utils::Redact;
use sasvend_core::{Error, ProvideCredential, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Short-lived signing key handed out by the service.
///
/// A key is used for one signature and then dropped.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDelegationKey {
    signed_oid: String,
    signed_tid: String,
    signed_start: String,
    signed_expiry: String,
    signed_service: String,
    signed_version: String,
    value: String,
}

impl Debug for UserDelegationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDelegationKey")
            .field("signed_oid", &self.signed_oid)
            .field("signed_tid", &self.signed_tid)
            .field("signed_start", &self.signed_start)
            .field("signed_expiry", &self.signed_expiry)
            .field("signed_service", &self.signed_service)
            .field("signed_version", &self.signed_version)
            .field("value", &Redact::from(&self.value))
            .finish()
    }
}

impl UserDelegationKey {
    /// Parse the body of a `Get User Delegation Key` response.
    pub fn from_xml(body: &str) -> Result<Self> {
        quick_xml::de::from_str(body).map_err(|e| {
            Error::unexpected("failed to parse user delegation key response").with_source(e)
        })
    }

    /// Object id of the principal the key was issued to.
    pub fn signed_oid(&self) -> &str {
        &self.signed_oid
    }

    /// Tenant of the principal.
    pub fn signed_tid(&self) -> &str {
        &self.signed_tid
    }

    /// When the key becomes valid.
    pub fn signed_start(&self) -> &str {
        &self.signed_start
    }

    /// When the key stops being valid.
    pub fn signed_expiry(&self) -> &str {
        &self.signed_expiry
    }

    /// Service the key is good for.
    pub fn signed_service(&self) -> &str {
        &self.signed_service
    }

    /// Service version the key was issued with.
    pub fn signed_version(&self) -> &str {
        &self.signed_version
    }

    /// Base64 encoded key material.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Request body of `Get User Delegation Key`.
#[derive(Serialize)]
#[serde(rename = "KeyInfo", rename_all = "PascalCase")]
pub(crate) struct KeyInfo {
    pub start: String,
    pub expiry: String,
}

impl KeyInfo {
    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self)
            .map_err(|e| Error::unexpected("failed to serialize key info").with_source(e))
    }
}

/// Requests user delegation keys for the ambient identity of an account.
#[derive(Debug, Clone)]
pub struct DelegationKeyIssuer {
    registry: Arc<ClientRegistry>,
    credential: Arc<dyn ProvideCredential<Credential = Identity>>,
    time: Option<DateTime>,
}

impl DelegationKeyIssuer {
    /// Create an issuer that resolves clients through `registry` and
    /// authenticates with the identity `credential` provides.
    pub fn new(
        registry: Arc<ClientRegistry>,
        credential: Arc<dyn ProvideCredential<Credential = Identity>>,
    ) -> Self {
        Self {
            registry,
            credential,
            time: None,
        }
    }

    /// Specify the issuing time.
    ///
    /// # Note
    ///
    /// We should always take current time to issue keys.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Request a key valid for `duration`, clamped to the service maximum.
    pub async fn issue(&self, path: &BlobPath, duration: Duration) -> Result<UserDelegationKey> {
        let client = self
            .registry
            .ambient(self.credential.as_ref(), path.account())
            .await?;
        let window = ExpiryWindow::compute(duration, self.time.unwrap_or_else(now));

        debug!(
            "requesting user delegation key for account {} until {}",
            path.account(),
            window.expiry()
        );
        client.user_delegation_key(&window).await
    }
}
