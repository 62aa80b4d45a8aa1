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

use crate::Identity;
use async_trait::async_trait;
use sasvend_core::{Context, ProvideCredential, Result};

/// Always provides the same identity.
#[derive(Clone, Debug)]
pub struct StaticCredentialProvider {
    identity: Identity,
}

impl StaticCredentialProvider {
    /// Provide a shared key identity.
    pub fn new_shared_key(account_name: &str, account_key: &str) -> Self {
        Self {
            identity: Identity::with_shared_key(account_name, account_key),
        }
    }

    /// Provide a SAS token identity.
    pub fn new_sas_token(account_name: &str, sas_token: &str) -> Self {
        Self {
            identity: Identity::with_sas_token(account_name, sas_token),
        }
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Identity;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(Some(self.identity.clone()))
    }
}
