use crate::account_sas::{join_query, urlencoded};
use crate::constants::STORAGE_VERSION;
use crate::permissions::{PermissionSet, Permissions, SasScope};
use crate::{BlobPath, ExpiryWindow, UserDelegationKey};
use log::debug;
use sasvend_core::hash;
use sasvend_core::time::format_rfc3339;
use sasvend_core::Result;

/// Container SAS signed with a user delegation key.
///
/// The token grants access to every blob inside the container (`sr=c`) and
/// only over https.
///
/// - [Create a user delegation SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-user-delegation-sas)
pub struct UserDelegationSas<'a> {
    account: &'a str,
    container: &'a str,
    key: &'a UserDelegationKey,
    window: ExpiryWindow,
    permissions: Permissions,
}

impl<'a> UserDelegationSas<'a> {
    /// Create a signer for the container of `path`.
    pub fn new(path: &'a BlobPath, key: &'a UserDelegationKey, window: ExpiryWindow) -> Self {
        Self {
            account: path.account(),
            container: path.container(),
            key,
            window,
            permissions: Permissions::empty(),
        }
    }

    /// Grant the union of `sets`.
    ///
    /// Blob level flags are a subset of the container vocabulary, so the
    /// union is always rendered in container order. Flags a container SAS
    /// cannot carry are dropped.
    pub fn with_permissions(mut self, sets: &[PermissionSet]) -> Self {
        self.permissions = sets
            .iter()
            .fold(self.permissions, |acc, set| acc.union(set.permissions()))
            .intersection(SasScope::Container.vocabulary());
        self
    }

    fn permission_string(&self) -> String {
        PermissionSet::new(SasScope::Container, self.permissions).to_sas_string()
    }

    // Version 2020-12-06 and later.
    fn signature(&self) -> Result<String> {
        let start = format_rfc3339(self.window.start());
        let expiry = format_rfc3339(self.window.expiry());
        let resource = format!("/blob/{}/{}", self.account, self.container);
        let permissions = self.permission_string();

        let string_to_sign = [
            permissions.as_str(),
            start.as_str(),
            expiry.as_str(),
            resource.as_str(),
            self.key.signed_oid(),
            self.key.signed_tid(),
            self.key.signed_start(),
            self.key.signed_expiry(),
            self.key.signed_service(),
            self.key.signed_version(),
            // saoid, suoid, scid, sip
            "",
            "",
            "",
            "",
            "https",
            STORAGE_VERSION,
            "c",
            // snapshot time, encryption scope
            "",
            "",
            // rscc, rscd, rsce, rscl, rsct
            "",
            "",
            "",
            "",
            "",
        ]
        .join("\n");

        debug!("user delegation SAS string to sign: {string_to_sign}");

        hash::base64_hmac_sha256(self.key.value(), string_to_sign.as_bytes())
    }

    /// Signed query pairs, values already url encoded.
    pub fn token(&self) -> Result<Vec<(String, String)>> {
        let sig = self.signature()?;

        Ok(vec![
            ("sv".to_string(), STORAGE_VERSION.to_string()),
            ("sr".to_string(), "c".to_string()),
            ("sp".to_string(), self.permission_string()),
            (
                "st".to_string(),
                urlencoded(format_rfc3339(self.window.start())),
            ),
            (
                "se".to_string(),
                urlencoded(format_rfc3339(self.window.expiry())),
            ),
            ("spr".to_string(), "https".to_string()),
            (
                "skoid".to_string(),
                urlencoded(self.key.signed_oid().to_string()),
            ),
            (
                "sktid".to_string(),
                urlencoded(self.key.signed_tid().to_string()),
            ),
            (
                "skt".to_string(),
                urlencoded(self.key.signed_start().to_string()),
            ),
            (
                "ske".to_string(),
                urlencoded(self.key.signed_expiry().to_string()),
            ),
            (
                "sks".to_string(),
                urlencoded(self.key.signed_service().to_string()),
            ),
            (
                "skv".to_string(),
                urlencoded(self.key.signed_version().to_string()),
            ),
            ("sig".to_string(), urlencoded(sig)),
        ])
    }

    /// The token as a query string without the leading `?`.
    pub fn token_string(&self) -> Result<String> {
        Ok(join_query(&self.token()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{BLOB_PERMISSIONS, CONTAINER_PERMISSIONS};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const KEY_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<UserDelegationKey>
    <SignedOid>oid-1</SignedOid>
    <SignedTid>tid-1</SignedTid>
    <SignedStart>2022-03-01T08:12:34Z</SignedStart>
    <SignedExpiry>2022-03-08T08:12:34Z</SignedExpiry>
    <SignedService>b</SignedService>
    <SignedVersion>2022-11-02</SignedVersion>
    <Value>ZGVsZWdhdGlvbi1rZXk=</Value>
</UserDelegationKey>"#;

    #[test]
    fn test_container_token() {
        let key = UserDelegationKey::from_xml(KEY_XML).expect("key must parse");
        let path = BlobPath::new("acct1", "data", Some("a/b.parquet")).unwrap();
        let window = ExpiryWindow::compute(
            Duration::from_secs(10 * 24 * 60 * 60),
            Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap(),
        );

        let token = UserDelegationSas::new(&path, &key, window)
            .with_permissions(&[BLOB_PERMISSIONS, CONTAINER_PERMISSIONS])
            .token_string()
            .expect("token must be generated");

        assert_eq!(
            token,
            "sv=2022-11-02&sr=c&sp=racwdltm\
             &st=2022-03-01T08%3A12%3A34Z&se=2022-03-08T08%3A12%3A34Z&spr=https\
             &skoid=oid-1&sktid=tid-1\
             &skt=2022-03-01T08%3A12%3A34Z&ske=2022-03-08T08%3A12%3A34Z\
             &sks=b&skv=2022-11-02\
             &sig=QYXw5RYiMrBp9yhVJxHjqmpX3yOiEOby7sTZ52pY0us%3D"
        );
    }

    #[test]
    fn test_blob_set_alone_renders_in_container_order() {
        let key = UserDelegationKey::from_xml(KEY_XML).unwrap();
        let path = BlobPath::new("acct1", "data", None).unwrap();
        let window = ExpiryWindow::starting_now(Duration::from_secs(60));

        let sas = UserDelegationSas::new(&path, &key, window).with_permissions(&[BLOB_PERMISSIONS]);
        assert_eq!(sas.permission_string(), "racwdtm");
    }
}
