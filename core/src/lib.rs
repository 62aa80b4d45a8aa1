//! Core components for issuing storage access signatures.
//!
//! This crate provides the foundational types and traits for the sasvend ecosystem.
//! Service crates build on top of it to mint scoped, time-bounded credentials.
//!
//! ## Overview
//!
//! The crate is built around several key concepts:
//!
//! - **Context**: A container that holds implementations for HTTP sending and environment access
//! - **Traits**: Abstract interfaces for credential loading (`ProvideCredential`) and validation (`SigningCredential`)
//! - **OnceMap**: A keyed construct-once cache used to share expensive handles across callers
//!
//! ## Example
//!
//! ```no_run
//! use sasvend_core::{Context, OnceMap, Result};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new();
//! let cache: OnceMap<String, Arc<String>> = OnceMap::new();
//!
//! let value = cache
//!     .get_or_try_init("account".to_string(), || async {
//!         Ok(Arc::new("expensive handle".to_string()))
//!     })
//!     .await?;
//! assert_eq!(value.as_str(), "expensive handle");
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```
//!
//! ## Traits
//!
//! - [`HttpSend`]: For sending HTTP requests
//! - [`Env`]: For environment variable access
//! - [`ProvideCredential`]: For loading credentials from various sources
//! - [`SigningCredential`]: For validating credentials
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time manipulation utilities
//! - [`utils`]: General utilities including data redaction and masking

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::Context;
pub use context::Env;
pub use context::HttpSend;
pub use context::NoopEnv;
pub use context::NoopHttpSend;
pub use context::OsEnv;
pub use context::StaticEnv;

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, SigningCredential};

mod once_map;
pub use once_map::OnceMap;
