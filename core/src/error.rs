use std::fmt;
use thiserror::Error;

/// The error type for sasvend operations
#[derive(Error, Debug)]
#[error("{message} ({kind}){}", render_context(.context, .retryable))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    context: Vec<String>,
    retryable: bool,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource reference is not owned by this storage system
    PathInvalid,

    /// Credentials exist but are invalid/malformed
    CredentialInvalid,

    /// The remote service rejected our credentials
    CredentialDenied,

    /// The remote service could not be reached or could not serve the request
    ServiceUnavailable,

    /// Request cannot be built (missing required fields, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// Unexpected errors (I/O, malformed responses, etc.)
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            context: Vec::new(),
            retryable: false,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a line of context, e.g. `account: foo`.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    fn set_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message without context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get attached context lines.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// Check if the failed operation may be retried.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Check if this is a credential error
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CredentialInvalid | ErrorKind::CredentialDenied
        )
    }
}

// Convenience constructors
impl Error {
    /// Create a path invalid error
    pub fn path_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PathInvalid, message)
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a credential denied error
    pub fn credential_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialDenied, message)
    }

    /// Create a service unavailable error, retryable by default
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message).set_retryable(true)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

fn render_context(context: &[String], retryable: &bool) -> String {
    let mut s = String::new();
    for ctx in context {
        s.push_str(", ");
        s.push_str(ctx);
    }
    if *retryable {
        s.push_str(", retryable");
    }
    s
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::PathInvalid => write!(f, "invalid path"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::CredentialDenied => write!(f, "credential access denied"),
            ErrorKind::ServiceUnavailable => write!(f, "service unavailable"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = Error::credential_denied("delegation key request rejected")
            .with_context("account: acct1")
            .with_context("status: 403");

        assert_eq!(
            err.to_string(),
            "delegation key request rejected (credential access denied), account: acct1, status: 403"
        );
        assert!(err.is_credential_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_service_unavailable_is_retryable() {
        let err = Error::service_unavailable("connection reset");
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(err.is_retryable());

        let err = err.set_retryable(false);
        assert!(!err.is_retryable());
    }
}
