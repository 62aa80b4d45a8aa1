use crate::constants::*;
use crate::RetryPolicy;
use sasvend_core::utils::Redact;
use sasvend_core::Context;
use std::fmt::{Debug, Formatter};

/// Config carries the client construction settings for Azure Blob Storage.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZBLOB_ACCOUNT_NAME`]
    /// - env value: [`AZURE_STORAGE_ACCOUNT_NAME`]
    pub account_name: Option<String>,
    /// `account_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZBLOB_ACCOUNT_KEY`]
    /// - env value: [`AZURE_STORAGE_ACCOUNT_KEY`]
    pub account_key: Option<String>,
    /// `sas_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_SAS_TOKEN`]
    pub sas_token: Option<String>,
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZBLOB_ENDPOINT`]
    ///
    /// When unset, clients talk to `https://{account}.blob.core.windows.net`.
    /// Set it to reach emulators such as Azurite, e.g.
    /// `http://127.0.0.1:10000/devstoreaccount1`.
    pub endpoint: Option<String>,
    /// Transport retry policy for every client built with this config.
    ///
    /// - env value: [`AZURE_STORAGE_RETRY_COUNT`]
    /// - env value: [`AZURE_STORAGE_RETRY_TIMEOUT`]
    pub retry: RetryPolicy,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &Redact::from(&self.account_key))
            .field("sas_token", &Redact::from(&self.sas_token))
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.account_name.is_none() {
            self.account_name = ctx
                .env_var(AZBLOB_ACCOUNT_NAME)
                .or_else(|| ctx.env_var(AZURE_STORAGE_ACCOUNT_NAME));
        }
        if self.account_key.is_none() {
            self.account_key = ctx
                .env_var(AZBLOB_ACCOUNT_KEY)
                .or_else(|| ctx.env_var(AZURE_STORAGE_ACCOUNT_KEY));
        }
        if self.sas_token.is_none() {
            self.sas_token = ctx.env_var(AZURE_STORAGE_SAS_TOKEN);
        }
        if self.endpoint.is_none() {
            self.endpoint = ctx
                .env_var(AZBLOB_ENDPOINT)
                .filter(|v| !v.trim().is_empty());
        }

        self.retry = self.retry.load_env(ctx);
        self
    }

    /// Set the account name.
    pub fn with_account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }

    /// Set the account key.
    pub fn with_account_key(mut self, account_key: impl Into<String>) -> Self {
        self.account_key = Some(account_key.into());
        self
    }

    /// Set the SAS token.
    pub fn with_sas_token(mut self, sas_token: impl Into<String>) -> Self {
        self.sas_token = Some(sas_token.into());
        self
    }

    /// Set the blob endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The blob endpoint for `account_name`, without a trailing slash.
    pub fn endpoint_for(&self, account_name: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{account_name}{BLOB_HOST_SUFFIX}"),
        }
    }
}
