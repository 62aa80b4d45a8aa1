use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Headers used in azure services.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const CONTENT_MD5: &str = "content-md5";

/// Service version sent with control plane requests and user delegation SAS.
pub const STORAGE_VERSION: &str = "2022-11-02";
/// Account SAS version. The `t` permission needs 2019-12-12 or later, and
/// 2020-12-06 adds the encryption scope to the string to sign.
pub const ACCOUNT_SAS_VERSION: &str = "2019-12-12";

// Env values used in azure services.
pub const AZBLOB_ACCOUNT_NAME: &str = "AZBLOB_ACCOUNT_NAME";
pub const AZBLOB_ACCOUNT_KEY: &str = "AZBLOB_ACCOUNT_KEY";
pub const AZBLOB_ENDPOINT: &str = "AZBLOB_ENDPOINT";
pub const AZURE_STORAGE_ACCOUNT_NAME: &str = "AZURE_STORAGE_ACCOUNT_NAME";
pub const AZURE_STORAGE_ACCOUNT_KEY: &str = "AZURE_STORAGE_ACCOUNT_KEY";
pub const AZURE_STORAGE_SAS_TOKEN: &str = "AZURE_STORAGE_SAS_TOKEN";
pub const AZURE_STORAGE_RETRY_COUNT: &str = "AZURE_STORAGE_RETRY_COUNT";
pub const AZURE_STORAGE_RETRY_TIMEOUT: &str = "AZURE_STORAGE_RETRY_TIMEOUT";

pub const BLOB_HOST_SUFFIX: &str = ".blob.core.windows.net";
pub const DFS_HOST_SUFFIX: &str = ".dfs.core.windows.net";

/// Shortest SAS token we accept when building a token-authenticated client.
pub const MIN_SAS_TOKEN_LEN: usize = 100;
/// Characters of an account key that may appear in logs.
pub const ACCOUNT_KEY_LOG_PREFIX: usize = 5;
/// Characters of a SAS token that may appear in logs.
pub const SAS_TOKEN_LOG_PREFIX: usize = 10;

/// Path segments keep `/` plus the unreserved set.
pub static PATH_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
