use crate::{BlobServiceClient, Config, Identity};
use log::info;
use sasvend_core::{Context, Error, OnceMap, ProvideCredential, Result};
use std::sync::Arc;

/// Process-wide cache of authenticated service clients, one per identity.
///
/// The first caller for an identity builds the client; concurrent callers
/// for the same identity wait for that build and receive the same handle.
/// Callers for other identities never wait on it. A failed build is not
/// remembered, so the next call tries again.
#[derive(Debug)]
pub struct ClientRegistry {
    ctx: Context,
    config: Config,
    clients: OnceMap<Identity, Arc<BlobServiceClient>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new(ctx: Context, config: Config) -> Self {
        Self {
            ctx,
            config,
            clients: OnceMap::new(),
        }
    }

    /// The context clients are built with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The config clients are built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of clients built so far.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check whether no client has been built yet.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Return the client for `identity`, building it on first use.
    pub async fn get_or_create(&self, identity: Identity) -> Result<Arc<BlobServiceClient>> {
        identity.validate()?;

        self.clients
            .get_or_try_init(identity.clone(), || async move {
                let endpoint = self.config.endpoint_for(identity.account_name());
                let masked = identity.masked_secret().to_string();
                let account = identity.account_name().to_string();

                let client = BlobServiceClient::connect(
                    self.ctx.clone(),
                    endpoint,
                    identity,
                    self.config.retry,
                )
                .await?;

                info!(
                    "created blob service client for account {account} at {} with secret {masked}",
                    client.endpoint()
                );
                Ok(Arc::new(client))
            })
            .await
    }

    /// Return the client authenticated with `account_key`.
    pub async fn shared_key(
        &self,
        account_name: &str,
        account_key: &str,
    ) -> Result<Arc<BlobServiceClient>> {
        self.get_or_create(Identity::with_shared_key(account_name, account_key))
            .await
    }

    /// Return the client authenticated with `token`.
    pub async fn sas_token(&self, account_name: &str, token: &str) -> Result<Arc<BlobServiceClient>> {
        self.get_or_create(Identity::with_sas_token(account_name, token))
            .await
    }

    /// Return the client for the ambient identity of `account_name`.
    pub async fn ambient(
        &self,
        provider: &dyn ProvideCredential<Credential = Identity>,
        account_name: &str,
    ) -> Result<Arc<BlobServiceClient>> {
        let identity = provider
            .provide_credential(&self.ctx)
            .await?
            .ok_or_else(|| {
                Error::credential_invalid("no ambient storage credential found")
                    .with_context(format!("account: {account_name}"))
            })?;

        if !identity.account_name().eq_ignore_ascii_case(account_name) {
            return Err(Error::credential_invalid(
                "ambient storage credential belongs to another account",
            )
            .with_context(format!("account: {account_name}"))
            .with_context(format!("credential_account: {}", identity.account_name())));
        }

        self.get_or_create(identity).await
    }
}
