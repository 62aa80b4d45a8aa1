use crate::constants::{BLOB_HOST_SUFFIX, DFS_HOST_SUFFIX, PATH_ENCODE_SET};
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use sasvend_core::{Error, Result};
use std::str::FromStr;

/// A container or blob in an Azure storage account.
///
/// Accepted spellings:
///
/// - `https://{account}.blob.core.windows.net/{container}[/{blob}]`
/// - `abfs[s]://{container}@{account}.dfs.core.windows.net[/{blob}]`
/// - `wasb[s]://{container}@{account}.blob.core.windows.net[/{blob}]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath {
    account: String,
    container: String,
    blob: Option<String>,
}

impl BlobPath {
    /// Build a path from its parts. An empty `blob` addresses the container.
    pub fn new(account: &str, container: &str, blob: Option<&str>) -> Result<Self> {
        if !is_valid_account(account) {
            return Err(Error::path_invalid("invalid storage account name")
                .with_context(format!("account: {account}")));
        }
        let container = container.trim_matches('/');
        if container.is_empty() || container.contains('/') {
            return Err(Error::path_invalid("invalid container name")
                .with_context(format!("container: {container}")));
        }

        Ok(Self {
            account: account.to_string(),
            container: container.to_string(),
            blob: blob
                .map(|b| b.trim_start_matches('/'))
                .filter(|b| !b.is_empty())
                .map(|b| b.to_string()),
        })
    }

    /// Parse a path owned by Azure Blob Storage.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || {
            Error::path_invalid("path is not an Azure Blob Storage location")
                .with_context(format!("path: {s}"))
        };

        let (scheme, rest) = s.split_once("://").ok_or_else(invalid)?;
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));

        match scheme.to_ascii_lowercase().as_str() {
            "https" | "http" => {
                let account = strip_suffix_ignore_case(authority, BLOB_HOST_SUFFIX)
                    .ok_or_else(invalid)?;
                let path = percent_decode_str(path).decode_utf8_lossy();
                let (container, blob) = path.split_once('/').unwrap_or((path.as_ref(), ""));
                Self::new(account, container, Some(blob))
            }
            "abfs" | "abfss" => {
                let (container, host) = authority.split_once('@').ok_or_else(invalid)?;
                let account =
                    strip_suffix_ignore_case(host, DFS_HOST_SUFFIX).ok_or_else(invalid)?;
                Self::new(account, container, Some(path))
            }
            "wasb" | "wasbs" => {
                let (container, host) = authority.split_once('@').ok_or_else(invalid)?;
                let account =
                    strip_suffix_ignore_case(host, BLOB_HOST_SUFFIX).ok_or_else(invalid)?;
                Self::new(account, container, Some(path))
            }
            _ => Err(invalid()),
        }
    }

    /// Storage account name.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Container name.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Blob name inside the container, if this path addresses a blob.
    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// The percent-encoded URL of this resource under `endpoint`.
    pub fn base_url(&self, endpoint: &str) -> String {
        let mut url = format!(
            "{}/{}",
            endpoint.trim_end_matches('/'),
            utf8_percent_encode(&self.container, &PATH_ENCODE_SET)
        );
        if let Some(blob) = &self.blob {
            url.push('/');
            url.extend(utf8_percent_encode(blob, &PATH_ENCODE_SET));
        }
        url
    }
}

impl FromStr for BlobPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn strip_suffix_ignore_case<'a>(host: &'a str, suffix: &str) -> Option<&'a str> {
    let split = host.len().checked_sub(suffix.len())?;
    if !host.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = host.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn is_valid_account(account: &str) -> bool {
    !account.is_empty() && account.chars().all(|c| c.is_ascii_alphanumeric())
}
