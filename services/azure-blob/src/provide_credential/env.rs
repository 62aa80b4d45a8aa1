use crate::constants::*;
use crate::Identity;
use async_trait::async_trait;
use sasvend_core::{Context, ProvideCredential, Result};

/// Load the ambient identity from environment variables.
///
/// - account name: `AZBLOB_ACCOUNT_NAME`, then `AZURE_STORAGE_ACCOUNT_NAME`
/// - account key: `AZBLOB_ACCOUNT_KEY`, then `AZURE_STORAGE_ACCOUNT_KEY`
/// - SAS token: `AZURE_STORAGE_SAS_TOKEN`, used when no key is set
#[derive(Clone, Debug, Default)]
pub struct EnvCredentialProvider {}

impl EnvCredentialProvider {
    /// Create a new env provider.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Identity;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let Some(account_name) = envs
            .get(AZBLOB_ACCOUNT_NAME)
            .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_NAME))
        else {
            return Ok(None);
        };

        if let Some(account_key) = envs
            .get(AZBLOB_ACCOUNT_KEY)
            .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_KEY))
        {
            return Ok(Some(Identity::with_shared_key(account_name, account_key)));
        }

        if let Some(sas_token) = envs.get(AZURE_STORAGE_SAS_TOKEN) {
            return Ok(Some(Identity::with_sas_token(account_name, sas_token)));
        }

        Ok(None)
    }
}
