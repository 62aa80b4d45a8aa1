use crate::{Context, Result};
use std::fmt::Debug;

/// SigningCredential is the trait used by issuers as the signing credential.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is valid.
    fn is_valid(&self) -> bool;
}

/// ProvideCredential is the trait used by issuers to load the ambient credential.
///
/// Services may require different credentials to sign, for example Azure Blob
/// Storage accepts either a shared key or an existing SAS token.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this loader.
    type Credential: SigningCredential;

    /// Load credential from current env.
    ///
    /// Returns `Ok(None)` when this source has nothing to offer.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}
