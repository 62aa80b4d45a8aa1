use crate::provide_credential::{ConfigCredentialProvider, EnvCredentialProvider};
use crate::{Config, Identity};
use async_trait::async_trait;
use log::{debug, warn};
use sasvend_core::{Context, ProvideCredential, Result, SigningCredential};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Default provider that tries multiple identity sources in order.
///
/// 1. Configuration (account key, SAS token)
/// 2. Environment variables
///
/// A source that fails, or returns an identity that cannot sign, is logged
/// and skipped.
pub struct DefaultCredentialProvider {
    providers: Vec<Box<dyn ProvideCredential<Credential = Identity>>>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new(Arc::new(Config::default()))
    }
}

impl Debug for DefaultCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultCredentialProvider")
            .field("providers", &self.providers)
            .finish()
    }
}

impl DefaultCredentialProvider {
    /// Create the default chain over `config`.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            providers: vec![
                Box::new(ConfigCredentialProvider::new(config)),
                Box::new(EnvCredentialProvider::new()),
            ],
        }
    }

    /// Add a provider to the end of the chain.
    pub fn push(mut self, provider: impl ProvideCredential<Credential = Identity>) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Identity;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        for provider in &self.providers {
            match provider.provide_credential(ctx).await {
                Ok(Some(identity)) if identity.is_valid() => {
                    debug!("loaded storage identity from provider: {provider:?}");
                    return Ok(Some(identity));
                }
                Ok(Some(identity)) => {
                    warn!("skipping unusable storage identity from provider {provider:?}: {identity:?}");
                    continue;
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("error loading storage identity from provider {provider:?}: {e}");
                    continue;
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use sasvend_core::{Error, StaticEnv};
    use std::collections::HashMap;

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait]
    impl ProvideCredential for FailingProvider {
        type Credential = Identity;

        async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
            Err(Error::unexpected("provider failed"))
        }
    }

    fn env_ctx() -> Context {
        Context::new().with_env(StaticEnv {
            envs: HashMap::from([
                (AZBLOB_ACCOUNT_NAME.to_string(), "envaccount".to_string()),
                (AZBLOB_ACCOUNT_KEY.to_string(), "ZW52a2V5".to_string()),
            ]),
        })
    }

    #[tokio::test]
    async fn test_config_wins_over_env() {
        let config = Config::default()
            .with_account_name("cfgaccount")
            .with_account_key("Y2Zna2V5");
        let provider = DefaultCredentialProvider::new(Arc::new(config));

        let cred = provider.provide_credential(&env_ctx()).await.unwrap();
        assert_eq!(cred, Some(Identity::with_shared_key("cfgaccount", "Y2Zna2V5")));
    }

    #[tokio::test]
    async fn test_falls_back_to_env() {
        let provider = DefaultCredentialProvider::default();

        let cred = provider.provide_credential(&env_ctx()).await.unwrap();
        assert_eq!(cred, Some(Identity::with_shared_key("envaccount", "ZW52a2V5")));
    }

    #[tokio::test]
    async fn test_failed_provider_is_skipped() {
        let provider = DefaultCredentialProvider {
            providers: vec![Box::new(FailingProvider), Box::new(EnvCredentialProvider::new())],
        };

        let cred = provider.provide_credential(&env_ctx()).await.unwrap();
        assert!(cred.is_some());
    }

    #[tokio::test]
    async fn test_unusable_identity_is_skipped() {
        let config = Config::default()
            .with_account_name("cfgaccount")
            .with_sas_token("sv=2022-11-02&sig=short");
        let provider = DefaultCredentialProvider::new(Arc::new(config));

        let cred = provider.provide_credential(&env_ctx()).await.unwrap();
        assert_eq!(cred, Some(Identity::with_shared_key("envaccount", "ZW52a2V5")));
    }

    #[tokio::test]
    async fn test_misconfigured_source_is_skipped() {
        let config = Config::default().with_account_key("Y2Zna2V5");
        let provider = DefaultCredentialProvider::new(Arc::new(config));

        let cred = provider.provide_credential(&env_ctx()).await.unwrap();
        assert_eq!(cred, Some(Identity::with_shared_key("envaccount", "ZW52a2V5")));
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let cred = DefaultCredentialProvider::default()
            .provide_credential(&Context::new())
            .await
            .unwrap();
        assert!(cred.is_none());
    }
}
