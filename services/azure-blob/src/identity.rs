// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::constants::{ACCOUNT_KEY_LOG_PREFIX, MIN_SAS_TOKEN_LEN, SAS_TOKEN_LOG_PREFIX};
use sasvend_core::utils::{Masked, Redact};
use sasvend_core::{Error, Result, SigningCredential};
use std::fmt::{Debug, Formatter};

/// Identity a service client authenticates as.
///
/// Identities compare and hash by value, so they double as the client cache key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Identity {
    /// Shared Key authentication with account name and key
    SharedKey {
        /// Azure storage account name.
        account_name: String,
        /// Azure storage account key.
        account_key: String,
    },
    /// SAS (Shared Access Signature) token authentication
    SasToken {
        /// Azure storage account name.
        account_name: String,
        /// SAS token.
        token: String,
    },
}

impl Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::SharedKey {
                account_name,
                account_key,
            } => f
                .debug_struct("Identity::SharedKey")
                .field("account_name", account_name)
                .field("account_key", &Redact::from(account_key))
                .finish(),
            Identity::SasToken {
                account_name,
                token,
            } => f
                .debug_struct("Identity::SasToken")
                .field("account_name", account_name)
                .field("token", &Redact::from(token))
                .finish(),
        }
    }
}

impl SigningCredential for Identity {
    fn is_valid(&self) -> bool {
        match self {
            Identity::SharedKey {
                account_name,
                account_key,
            } => !account_name.is_empty() && !account_key.is_empty(),
            Identity::SasToken {
                account_name,
                token,
            } => !account_name.is_empty() && token.len() >= MIN_SAS_TOKEN_LEN,
        }
    }
}

impl Identity {
    /// Create a new identity with shared key authentication.
    pub fn with_shared_key(account_name: &str, account_key: &str) -> Self {
        Self::SharedKey {
            account_name: account_name.to_string(),
            account_key: account_key.to_string(),
        }
    }

    /// Create a new identity with SAS token authentication.
    ///
    /// A leading `?` is dropped.
    pub fn with_sas_token(account_name: &str, token: &str) -> Self {
        Self::SasToken {
            account_name: account_name.to_string(),
            token: token.trim_start_matches('?').to_string(),
        }
    }

    /// Azure storage account name.
    pub fn account_name(&self) -> &str {
        match self {
            Identity::SharedKey { account_name, .. } => account_name,
            Identity::SasToken { account_name, .. } => account_name,
        }
    }

    /// The secret reduced to the prefix allowed in logs.
    pub fn masked_secret(&self) -> Masked<'_> {
        match self {
            Identity::SharedKey { account_key, .. } => {
                Masked::new(account_key, ACCOUNT_KEY_LOG_PREFIX)
            }
            Identity::SasToken { token, .. } => Masked::new(token, SAS_TOKEN_LOG_PREFIX),
        }
    }

    /// Local checks that must pass before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.account_name().is_empty() {
            return Err(Error::credential_invalid("account name is empty"));
        }

        match self {
            Identity::SharedKey { account_key, .. } if account_key.is_empty() => {
                Err(Error::credential_invalid("account key is empty")
                    .with_context(format!("account: {}", self.account_name())))
            }
            Identity::SasToken { token, .. } if token.len() < MIN_SAS_TOKEN_LEN => Err(
                Error::credential_invalid("SAS token is missing or too short")
                    .with_context(format!("account: {}", self.account_name()))
                    .with_context(format!("token_length: {}", token.len())),
            ),
            _ => Ok(()),
        }
    }
}
