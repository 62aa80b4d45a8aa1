use crate::{Config, Identity};
use async_trait::async_trait;
use sasvend_core::{Context, Error, ProvideCredential, Result};
use std::sync::Arc;

/// Provide the identity set in a [`Config`].
///
/// A shared key wins over a SAS token when both are present. A credential
/// configured without an account name is a configuration error.
#[derive(Debug, Clone)]
pub struct ConfigCredentialProvider {
    config: Arc<Config>,
}

impl ConfigCredentialProvider {
    /// Create a provider reading `config`.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for ConfigCredentialProvider {
    type Credential = Identity;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        let Some(account_name) = self.config.account_name.as_deref().filter(|v| !v.is_empty())
        else {
            if self.config.account_key.is_some() || self.config.sas_token.is_some() {
                return Err(Error::config_invalid(
                    "account_name is required when a credential is configured",
                ));
            }
            return Ok(None);
        };

        if let Some(account_key) = self.config.account_key.as_deref().filter(|v| !v.is_empty()) {
            return Ok(Some(Identity::with_shared_key(account_name, account_key)));
        }

        if let Some(sas_token) = self.config.sas_token.as_deref().filter(|v| !v.is_empty()) {
            return Ok(Some(Identity::with_sas_token(account_name, sas_token)));
        }

        Ok(None)
    }
}
