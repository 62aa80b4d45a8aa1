use crate::mock::{long_token, registry, MockBlobService};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use sasvend_azure_blob::{BlobPath, SasSigner, StaticCredentialProvider};
use sasvend_core::hash::base64_encode;
use sasvend_core::time::DateTime;
use sasvend_core::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

fn test_time() -> DateTime {
    Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
}

fn signer(mock: &MockBlobService, credential: StaticCredentialProvider) -> SasSigner {
    SasSigner::new(registry(mock), Arc::new(credential)).with_time(test_time())
}

fn query_value<'a>(token: &'a str, key: &str) -> Option<&'a str> {
    token
        .split('&')
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[tokio::test]
async fn test_account_sas_via_key() {
    let mock = MockBlobService::new();
    let key = base64_encode(b"key");
    let signer = signer(&mock, StaticCredentialProvider::new_shared_key("acct1", &key));
    let path = BlobPath::parse("abfss://data@acct1.dfs.core.windows.net/a/b.parquet").unwrap();

    let token = signer
        .account_sas_via_key(&path, Duration::from_secs(10 * 60 * 60))
        .await
        .expect("token must be issued");

    assert_eq!(token, "sv=2019-12-12&ss=bf&srt=sco&se=2022-03-01T18%3A12%3A34Z&sp=rwdlacut&st=2022-03-01T08%3A12%3A34Z&sig=1g6veAVVl4fBJoemFFMFmjiqOEUXNCg%2B9v%2FA%2BPnBl34%3D");
    assert_eq!(mock.probes(), 1);
}

#[tokio::test]
async fn test_account_sas_via_key_for_clamps_to_seven_days() {
    let mock = MockBlobService::new();
    let signer = signer(&mock, StaticCredentialProvider::new_shared_key("other", "a2V5MQ=="));

    let token = signer
        .account_sas_via_key_for("acct1", "a2V5MQ==", Duration::from_secs(30 * 24 * 60 * 60))
        .await
        .unwrap();

    assert_eq!(query_value(&token, "se"), Some("2022-03-08T08%3A12%3A34Z"));
    assert_eq!(query_value(&token, "sp"), Some("rwdlacut"));
}

#[tokio::test]
async fn test_container_sas_via_delegation_clamps() {
    let mock = MockBlobService::new();
    let signer = signer(&mock, StaticCredentialProvider::new_shared_key("acct1", "a2V5MQ=="));
    let path = BlobPath::parse("https://acct1.blob.core.windows.net/data/a/b.parquet").unwrap();

    let token = signer
        .container_sas_via_delegation(&path, Duration::from_secs(10 * 24 * 60 * 60))
        .await
        .expect("token must be issued");

    assert_eq!(
        token,
        "sv=2022-11-02&sr=c&sp=racwdltm\
         &st=2022-03-01T08%3A12%3A34Z&se=2022-03-08T08%3A12%3A34Z&spr=https\
         &skoid=oid-1&sktid=tid-1\
         &skt=2022-03-01T08%3A12%3A34Z&ske=2022-03-08T08%3A12%3A34Z\
         &sks=b&skv=2022-11-02\
         &sig=QYXw5RYiMrBp9yhVJxHjqmpX3yOiEOby7sTZ52pY0us%3D"
    );

    assert_eq!(mock.key_requests(), 1);
    let key_request = mock
        .requests()
        .into_iter()
        .find(|r| r.uri.contains("comp=userdelegationkey"))
        .unwrap();
    assert_eq!(key_request.method, http::Method::POST);
    assert_eq!(
        key_request.body,
        "<KeyInfo><Start>2022-03-01T08:12:34Z</Start><Expiry>2022-03-08T08:12:34Z</Expiry></KeyInfo>"
    );
}

#[tokio::test]
async fn test_delegation_keys_are_not_cached() {
    let mock = MockBlobService::new();
    let signer = signer(&mock, StaticCredentialProvider::new_shared_key("acct1", "a2V5MQ=="));
    let path = BlobPath::parse("https://acct1.blob.core.windows.net/data").unwrap();

    for _ in 0..3 {
        signer
            .container_sas_via_delegation(&path, Duration::from_secs(3600))
            .await
            .unwrap();
    }

    assert_eq!(mock.key_requests(), 3);
    assert_eq!(mock.probes(), 1);
}

#[tokio::test]
async fn test_zero_duration_is_rejected() {
    let mock = MockBlobService::new();
    let signer = signer(&mock, StaticCredentialProvider::new_shared_key("acct1", "a2V5MQ=="));
    let path = BlobPath::parse("https://acct1.blob.core.windows.net/data").unwrap();

    let err = signer
        .container_sas_via_delegation(&path, Duration::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);

    let err = signer
        .account_sas_via_key(&path, Duration::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);

    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_ambient_identity_for_other_account() {
    let mock = MockBlobService::new();
    let signer = signer(&mock, StaticCredentialProvider::new_shared_key("acct2", "a2V5MQ=="));
    let path = BlobPath::parse("https://acct1.blob.core.windows.net/data").unwrap();

    let err = signer
        .account_sas_via_key(&path, Duration::from_secs(3600))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_account_sas_needs_shared_key() {
    let mock = MockBlobService::new();
    let signer = signer(
        &mock,
        StaticCredentialProvider::new_sas_token("acct1", &long_token()),
    );
    let path = BlobPath::parse("https://acct1.blob.core.windows.net/data").unwrap();

    let err = signer
        .account_sas_via_key(&path, Duration::from_secs(3600))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
}
