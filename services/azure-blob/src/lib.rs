//! Shared Access Signatures for Azure Blob Storage.
//!
//! This crate mints short-lived, capability-limited SAS tokens for containers
//! and storage accounts, and keeps one authenticated service client per
//! identity so repeated requests do not pay for client construction.
//!
//! - Container SAS signed with a user delegation key
//! - Account SAS signed with the storage account key
//! - Client-facing URLs with an optional token attached
//!
//! # Example
//!
//! ```rust,no_run
//! use sasvend_azure_blob::{
//!     BlobPath, ClientRegistry, Config, DefaultCredentialProvider, SasSigner, UrlComposer,
//! };
//! use sasvend_core::{Context, OsEnv, Result};
//! use sasvend_http_send_reqwest::ReqwestHttpSend;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!     let config = Arc::new(Config::default().from_env(&ctx));
//!
//!     let registry = Arc::new(ClientRegistry::new(ctx, config.as_ref().clone()));
//!     let credential = Arc::new(DefaultCredentialProvider::new(config.clone()));
//!     let signer = SasSigner::new(registry, credential);
//!
//!     let path = BlobPath::parse("abfss://data@myaccount.dfs.core.windows.net/a/b.parquet")?;
//!     let sas = signer
//!         .container_sas_via_delegation(&path, Duration::from_secs(3600))
//!         .await?;
//!
//!     let url = UrlComposer::new(config.as_ref().clone()).to_url(&path, Some(&sas));
//!     println!("{url}");
//!     Ok(())
//! }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

pub mod permissions;
pub use permissions::{
    PermissionSet, Permissions, ResourceTypes, SasScope, Services, ACCOUNT_PERMISSIONS,
    BLOB_PERMISSIONS, CONTAINER_PERMISSIONS,
};

mod window;
pub use window::{ExpiryWindow, MAX_SAS_LIFETIME};

mod identity;
pub use identity::Identity;

mod path;
pub use path::BlobPath;

mod retry;
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_PER_TRY_TIMEOUT};

mod config;
pub use config::Config;

mod sign_request;

mod account_sas;
pub use account_sas::AccountSharedAccessSignature;

mod delegation_sas;
pub use delegation_sas::UserDelegationSas;

mod delegation_key;
pub use delegation_key::{DelegationKeyIssuer, UserDelegationKey};

mod client;
pub use client::BlobServiceClient;

mod registry;
pub use registry::ClientRegistry;

mod signer;
pub use signer::SasSigner;

mod url;
pub use url::UrlComposer;

mod provide_credential;
pub use provide_credential::*;
