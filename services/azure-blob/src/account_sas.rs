use crate::constants::ACCOUNT_SAS_VERSION;
use crate::permissions::{
    PermissionSet, ResourceTypes, SasScope, Services, ACCOUNT_PERMISSIONS,
    ACCOUNT_SAS_RESOURCE_TYPES, ACCOUNT_SAS_SERVICES,
};
use sasvend_core::hash;
use sasvend_core::time::{format_rfc3339, DateTime};
use sasvend_core::Result;

/// Account SAS signed with the storage account key.
///
/// - [Create an account SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas)
pub struct AccountSharedAccessSignature {
    account: String,
    key: String,
    version: String,
    services: Services,
    resource_types: ResourceTypes,
    permissions: PermissionSet,
    expiry: DateTime,
    start: Option<DateTime>,
    ip: Option<String>,
    protocol: Option<String>,
}

impl AccountSharedAccessSignature {
    /// Create a SAS token signer with default parameters
    pub fn new(account: String, key: String, expiry: DateTime) -> Self {
        Self {
            account,
            key,
            expiry,
            start: None,
            ip: None,
            protocol: None,
            version: ACCOUNT_SAS_VERSION.to_string(),
            services: ACCOUNT_SAS_SERVICES,
            resource_types: ACCOUNT_SAS_RESOURCE_TYPES,
            permissions: ACCOUNT_PERMISSIONS,
        }
    }

    /// Set the time the token becomes valid.
    pub fn with_start(mut self, start: DateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the granted permissions.
    pub fn with_permissions(mut self, permissions: PermissionSet) -> Self {
        self.permissions = permissions;
        self
    }

    /// Set the reachable services.
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Set the reachable resource types.
    pub fn with_resource_types(mut self, resource_types: ResourceTypes) -> Self {
        self.resource_types = resource_types;
        self
    }

    /// Restrict the token to an IP or IP range.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Restrict the token to a protocol, e.g. `https`.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    // Azure documentation: https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas#construct-the-signature-string
    fn signature(&self) -> Result<String> {
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            self.account,
            self.permissions.to_sas_string_for(SasScope::Account),
            self.services.to_sas_string(),
            self.resource_types.to_sas_string(),
            self.start.map(format_rfc3339).unwrap_or_default(),
            format_rfc3339(self.expiry),
            self.ip.clone().unwrap_or_default(),
            self.protocol.clone().unwrap_or_default(),
            self.version,
        );

        hash::base64_hmac_sha256(&self.key, string_to_sign.as_bytes())
    }

    /// Signed query pairs, values already url encoded.
    pub fn token(&self) -> Result<Vec<(String, String)>> {
        let mut elements: Vec<(String, String)> = vec![
            ("sv".to_string(), self.version.to_string()),
            ("ss".to_string(), self.services.to_sas_string()),
            ("srt".to_string(), self.resource_types.to_sas_string()),
            ("se".to_string(), urlencoded(format_rfc3339(self.expiry))),
            (
                "sp".to_string(),
                self.permissions.to_sas_string_for(SasScope::Account),
            ),
        ];

        if let Some(start) = self.start {
            elements.push(("st".to_string(), urlencoded(format_rfc3339(start))))
        }
        if let Some(ip) = &self.ip {
            elements.push(("sip".to_string(), urlencoded(ip.to_string())))
        }
        if let Some(protocol) = &self.protocol {
            elements.push(("spr".to_string(), protocol.to_string()))
        }

        let sig = self.signature()?;
        elements.push(("sig".to_string(), urlencoded(sig)));

        Ok(elements)
    }

    /// The token as a query string without the leading `?`.
    pub fn token_string(&self) -> Result<String> {
        Ok(join_query(&self.token()?))
    }
}

pub(crate) fn urlencoded(s: String) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

pub(crate) fn join_query(elements: &[(String, String)]) -> String {
    elements
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<String>>()
        .join("&")
}
