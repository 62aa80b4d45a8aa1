use crate::account_sas::AccountSharedAccessSignature;
use crate::constants::*;
use crate::delegation_key::KeyInfo;
use crate::permissions::{PermissionSet, ResourceTypes, Services};
use crate::sign_request::RequestSigner;
use crate::{ExpiryWindow, Identity, RetryPolicy, UserDelegationKey};
use bytes::Bytes;
use http::{header, Method, Request, Response, StatusCode};
use log::debug;
use sasvend_core::time::format_rfc3339;
use sasvend_core::{Context, Error, Result};
use serde::Deserialize;

/// An authenticated handle to one storage account's blob service.
///
/// Clients are built by [`crate::ClientRegistry`] and shared read-only.
#[derive(Debug)]
pub struct BlobServiceClient {
    ctx: Context,
    endpoint: String,
    identity: Identity,
    retry: RetryPolicy,
    signer: RequestSigner,
}

impl BlobServiceClient {
    /// Build a client and verify it with one authenticated request.
    ///
    /// Local credential checks run first, so malformed identities never reach
    /// the network.
    pub async fn connect(
        ctx: Context,
        endpoint: impl Into<String>,
        identity: Identity,
        retry: RetryPolicy,
    ) -> Result<Self> {
        identity.validate()?;

        let client = Self {
            ctx,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            identity,
            retry,
            signer: RequestSigner::new(),
        };
        client.probe().await?;
        Ok(client)
    }

    /// Storage account name.
    pub fn account_name(&self) -> &str {
        self.identity.account_name()
    }

    /// Blob endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Identity this client authenticates as.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get Account Information.
    ///
    /// Cheap, and authenticated with every identity kind.
    async fn probe(&self) -> Result<()> {
        let url = format!("{}/?restype=account&comp=properties", self.endpoint);
        self.send("get account information", || {
            Ok(Request::builder()
                .method(Method::GET)
                .uri(&url)
                .header(X_MS_VERSION, STORAGE_VERSION)
                .body(Bytes::new())?)
        })
        .await?;
        Ok(())
    }

    /// Request a user delegation key valid for `window`.
    ///
    /// - [Get User Delegation Key](https://learn.microsoft.com/en-us/rest/api/storageservices/get-user-delegation-key)
    pub async fn user_delegation_key(&self, window: &ExpiryWindow) -> Result<UserDelegationKey> {
        let url = format!("{}/?restype=service&comp=userdelegationkey", self.endpoint);
        let body = Bytes::from(
            KeyInfo {
                start: format_rfc3339(window.start()),
                expiry: format_rfc3339(window.expiry()),
            }
            .to_xml()?,
        );

        let resp = self
            .send("get user delegation key", || {
                Ok(Request::builder()
                    .method(Method::POST)
                    .uri(&url)
                    .header(X_MS_VERSION, STORAGE_VERSION)
                    .header(header::CONTENT_TYPE, "application/xml")
                    .header(header::CONTENT_LENGTH, body.len())
                    .body(body.clone())?)
            })
            .await?;

        UserDelegationKey::from_xml(resp.body())
            .map_err(|e| e.with_context(format!("account: {}", self.account_name())))
    }

    /// Sign an account SAS with this client's shared key.
    ///
    /// Fails with [`sasvend_core::ErrorKind::CredentialInvalid`] for clients
    /// that authenticate with a SAS token.
    pub fn account_sas(
        &self,
        window: &ExpiryWindow,
        permissions: PermissionSet,
        services: Services,
        resource_types: ResourceTypes,
    ) -> Result<String> {
        let Identity::SharedKey {
            account_name,
            account_key,
        } = &self.identity
        else {
            return Err(
                Error::credential_invalid("account SAS requires a shared key identity")
                    .with_context(format!("account: {}", self.account_name())),
            );
        };

        AccountSharedAccessSignature::new(
            account_name.clone(),
            account_key.clone(),
            window.expiry(),
        )
        .with_start(window.start())
        .with_permissions(permissions)
        .with_services(services)
        .with_resource_types(resource_types)
        .token_string()
    }

    /// Send an authorized request under the retry policy.
    ///
    /// `build` runs once per attempt so every attempt is signed afresh.
    async fn send<F>(&self, op: &str, build: F) -> Result<Response<String>>
    where
        F: Fn() -> Result<Request<Bytes>>,
    {
        let build = &build;
        self.retry
            .run(op, move || async move {
                let (mut parts, body) = build()?.into_parts();
                self.signer.sign(&mut parts, &self.identity)?;
                debug!("sending {op}: {} {}", parts.method, parts.uri.path());

                let resp = self
                    .ctx
                    .http_send_as_string(Request::from_parts(parts, body))
                    .await?;
                check_status(resp)
            })
            .await
            .map_err(|e| e.with_context(format!("account: {}", self.account_name())))
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct StorageErrorBody {
    code: String,
    message: String,
}

fn check_status(resp: Response<String>) -> Result<Response<String>> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::credential_denied("storage service rejected the credential")
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => {
            Error::service_unavailable("storage service is throttling requests")
        }
        s if s.is_server_error() => Error::service_unavailable("storage service is unavailable"),
        _ => Error::unexpected("storage service returned an unexpected status"),
    };
    let mut err = err.with_context(format!("status: {status}"));

    if let Ok(body) = quick_xml::de::from_str::<StorageErrorBody>(resp.body()) {
        if !body.code.is_empty() {
            err = err.with_context(format!("code: {}", body.code));
        }
        if !body.message.is_empty() {
            err = err.with_context(format!("message: {}", body.message.trim()));
        }
    }

    Err(err)
}
