use crate::{BlobPath, Config};
use percent_encoding::percent_decode_str;
use sasvend_core::Result;

/// Builds client-facing URLs for storage paths.
#[derive(Debug, Clone, Default)]
pub struct UrlComposer {
    config: Config,
}

impl UrlComposer {
    /// Create a composer that resolves endpoints through `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The plain URL of `path`, with `?{sas}` appended verbatim when given.
    ///
    /// The URL is percent-decoded and carries no trailing `/`.
    pub fn to_url(&self, path: &BlobPath, sas: Option<&str>) -> String {
        let encoded = path.base_url(&self.config.endpoint_for(path.account()));
        let decoded = percent_decode_str(&encoded).decode_utf8_lossy();
        let base = decoded.trim_end_matches('/');

        match sas {
            Some(sas) => format!("{base}?{sas}"),
            None => base.to_string(),
        }
    }

    /// Parse `path` and build its URL.
    pub fn to_url_str(&self, path: &str, sas: Option<&str>) -> Result<String> {
        Ok(self.to_url(&BlobPath::parse(path)?, sas))
    }
}
