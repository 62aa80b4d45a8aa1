//! [`HttpSend`] implementation backed by [`reqwest`].
//!
//! Transport failures are reported as retryable
//! [`ErrorKind::ServiceUnavailable`](sasvend_core::ErrorKind::ServiceUnavailable)
//! so the caller's retry policy can act on them. HTTP status codes are left
//! to the caller.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, Request};
use sasvend_core::{Error, HttpSend, Result};

/// ReqwestHttpSend sends control plane requests with a shared [`Client`].
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        // Queries may carry SAS tokens, keep them out of errors.
        let uri = format!(
            "{}://{}{}",
            req.uri().scheme_str().unwrap_or("https"),
            req.uri().authority().map(|a| a.as_str()).unwrap_or_default(),
            req.uri().path()
        );
        let req = Request::try_from(req).map_err(|e| {
            Error::request_invalid("failed to convert http request")
                .with_source(e.without_url())
                .with_context(format!("uri: {uri}"))
        })?;

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| classify(e, &uri))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| classify(e, &uri))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

fn classify(err: reqwest::Error, uri: &str) -> Error {
    let msg = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "failed to connect"
    } else {
        "failed to send request"
    };

    Error::service_unavailable(msg)
        .with_source(err.without_url())
        .with_context(format!("uri: {uri}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sasvend_core::{Context, ErrorKind};
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_failure_is_retryable() {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(200))
            .build()
            .expect("client must build");
        let ctx = Context::new().with_http_send(ReqwestHttpSend::new(client));

        // Port 9 (discard) on loopback is closed in test environments.
        let req = http::Request::get("http://127.0.0.1:9/?sig=secret")
            .body(Bytes::new())
            .expect("request must build");

        let err = ctx.http_send(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.is_retryable());
        assert!(err.context().iter().any(|c| c.contains("127.0.0.1:9")));
        assert!(!format!("{err:?}").contains("secret"));
    }
}
