use crate::constants::*;
use crate::Identity;
use http::request::Parts;
use http::{header, HeaderValue, Uri};
use log::debug;
use sasvend_core::hash::base64_hmac_sha256;
use sasvend_core::time::{format_http_date, now, DateTime};
use sasvend_core::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write;

/// RequestSigner authorizes control plane requests for an [`Identity`].
///
/// - Shared key identities sign with [Shared Key](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key).
/// - SAS token identities append their token to the query string.
#[derive(Debug, Default, Clone)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Authorize `req` in place.
    pub fn sign(&self, req: &mut Parts, identity: &Identity) -> Result<()> {
        match identity {
            Identity::SasToken { token, .. } => {
                req.uri = append_query(&req.uri, token)?;
            }
            Identity::SharedKey {
                account_name,
                account_key,
            } => {
                let now_time = self.time.unwrap_or_else(now);
                req.headers
                    .insert(X_MS_DATE, header_value(&format_http_date(now_time))?);

                let string_to_sign = string_to_sign(req, account_name)?;
                let signature = base64_hmac_sha256(account_key, string_to_sign.as_bytes())
                    .map_err(|e| e.with_context(format!("account: {account_name}")))?;

                let mut value = header_value(&format!("SharedKey {account_name}:{signature}"))?;
                value.set_sensitive(true);
                req.headers.insert(header::AUTHORIZATION, value);
            }
        }

        Ok(())
    }
}

fn header_value(v: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(v)
        .map_err(|e| Error::unexpected("failed to build header value").with_source(e))
}

fn append_query(uri: &Uri, query: &str) -> Result<Uri> {
    let sep = match uri.query() {
        Some(q) if !q.is_empty() => "&",
        Some(_) => "",
        None => "?",
    };

    format!("{uri}{sep}{query}").parse().map_err(|e| {
        Error::request_invalid("failed to append SAS token to request uri").with_source(e)
    })
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-Encoding + "\n" +
/// Content-Language + "\n" +
/// Content-Length + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// If-Modified-Since + "\n" +
/// If-Match + "\n" +
/// If-None-Match + "\n" +
/// If-Unmodified-Since + "\n" +
/// Range + "\n" +
/// CanonicalizedHeaders +
/// CanonicalizedResource;
/// ```
///
/// ## Reference
///
/// - [Blob, Queue, and File Services (Shared Key authorization)](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
fn string_to_sign(req: &Parts, account_name: &str) -> Result<String> {
    let mut s = String::with_capacity(256);

    s.push_str(req.method.as_str());
    s.push('\n');
    for name in [
        header::CONTENT_ENCODING.as_str(),
        header::CONTENT_LANGUAGE.as_str(),
    ] {
        s.push_str(header_get_or_default(req, name)?);
        s.push('\n');
    }
    // An empty body is signed as an empty string, not "0".
    match header_get_or_default(req, header::CONTENT_LENGTH.as_str())? {
        "0" => {}
        v => s.push_str(v),
    }
    s.push('\n');
    for name in [
        CONTENT_MD5,
        header::CONTENT_TYPE.as_str(),
        header::DATE.as_str(),
        header::IF_MODIFIED_SINCE.as_str(),
        header::IF_MATCH.as_str(),
        header::IF_NONE_MATCH.as_str(),
        header::IF_UNMODIFIED_SINCE.as_str(),
        header::RANGE.as_str(),
    ] {
        s.push_str(header_get_or_default(req, name)?);
        s.push('\n');
    }
    s.push_str(&canonicalize_header(req)?);
    s.push_str(&canonicalize_resource(req, account_name));

    debug!("string to sign: {}", &s);

    Ok(s)
}

fn header_get_or_default<'a>(req: &'a Parts, name: &str) -> Result<&'a str> {
    match req.headers.get(name) {
        None => Ok(""),
        Some(v) => v.to_str().map_err(|e| {
            Error::request_invalid("header value is not visible ascii")
                .with_source(e)
                .with_context(format!("header: {name}"))
        }),
    }
}

/// ## Reference
///
/// - [Constructing the canonicalized headers string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-headers-string)
fn canonicalize_header(req: &Parts) -> Result<String> {
    let mut headers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in req.headers.iter() {
        if !name.as_str().starts_with("x-ms-") {
            continue;
        }
        let value = value.to_str().map_err(|e| {
            Error::request_invalid("header value is not visible ascii")
                .with_source(e)
                .with_context(format!("header: {name}"))
        })?;
        headers.entry(name.as_str()).or_default().push(value.trim());
    }

    let mut s = String::new();
    for (name, values) in headers {
        // Writing into a String never fails.
        let _ = writeln!(s, "{name}:{}", values.join(","));
    }
    Ok(s)
}

/// ## Reference
///
/// - [Constructing the canonicalized resource string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
fn canonicalize_resource(req: &Parts, account_name: &str) -> String {
    let mut s = format!("/{}{}", account_name, req.uri.path());

    let Some(query) = req.uri.query().filter(|q| !q.is_empty()) else {
        return s;
    };

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (k, v) in form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(k.to_lowercase())
            .or_default()
            .push(v.into_owned());
    }

    for (k, mut values) in params {
        values.sort();
        let _ = write!(s, "\n{k}:{}", values.join(","));
    }
    s
}
