//! Error types for upstream operations.
//!
//! Every failure carries a [`ProviderErrorCode`] discriminant and an HTTP
//! status tag so the aggregator and the request layer can decide between
//! retrying, serving a stale snapshot, or surfacing the error.

use std::fmt;
use thiserror::Error;

/// Message used for every "gave up after retries" failure.
pub const FETCH_FAILED: &str = "Planning Center fetch failed";

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Missing or invalid configuration (credentials, URLs).
    ConfigurationError,
    /// Upstream unreachable: DNS, TLS, connect, timeout.
    NetworkError,
    /// Upstream reachable but answering 5xx after all retries.
    ServerError,
    /// Upstream rejected the request (4xx); not transient.
    ClientError,
    /// Response body could not be parsed or had an unexpected shape.
    InvalidResponse,
    /// Unexpected internal state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ServerError)
    }

    /// Returns the status tag used when the error does not carry one.
    pub fn default_status(&self) -> u16 {
        match self {
            Self::ConfigurationError | Self::NetworkError | Self::ServerError => 503,
            Self::ClientError => 400,
            Self::InvalidResponse => 502,
            Self::InternalError => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "configuration_error",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::ClientError => "client_error",
            Self::InvalidResponse => "invalid_response",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to the upstream API.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// HTTP status tag surfaced to callers.
    status: Option<u16>,
    /// Upstream body text or stringified transport failure.
    body: Option<String>,
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            body: None,
            provider: None,
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates a client error tagged with the upstream status.
    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ClientError, message).with_status(status)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the HTTP status tag.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches upstream body text or other diagnostic context.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status tag, falling back to the code's default.
    pub fn status(&self) -> u16 {
        self.status.unwrap_or_else(|| self.code.default_status())
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Returns true when a previously cached snapshot may stand in for the
    /// failed fetch.
    ///
    /// Availability problems qualify; request-shape problems (4xx) and
    /// configuration problems do not.
    pub fn allows_stale_fallback(&self) -> bool {
        matches!(
            self.code,
            ProviderErrorCode::NetworkError
                | ProviderErrorCode::ServerError
                | ProviderErrorCode::InvalidResponse
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        Ok(())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_retryable() {
        assert!(ProviderErrorCode::NetworkError.is_retryable());
        assert!(ProviderErrorCode::ServerError.is_retryable());
        assert!(!ProviderErrorCode::ClientError.is_retryable());
        assert!(!ProviderErrorCode::ConfigurationError.is_retryable());
    }

    #[test]
    fn status_defaults_by_code() {
        assert_eq!(ProviderError::configuration("x").status(), 503);
        assert_eq!(ProviderError::network("x").status(), 503);
        assert_eq!(ProviderError::server("x").status(), 503);
        assert_eq!(ProviderError::invalid_response("x").status(), 502);
        assert_eq!(ProviderError::internal("x").status(), 500);
    }

    #[test]
    fn client_error_keeps_upstream_status() {
        let err = ProviderError::client(404, "Planning Center API error").with_body("not found");
        assert_eq!(err.status(), 404);
        assert_eq!(err.body(), Some("not found"));
        assert!(!err.allows_stale_fallback());
    }

    #[test]
    fn stale_fallback_classification() {
        assert!(ProviderError::network(FETCH_FAILED).allows_stale_fallback());
        assert!(ProviderError::server(FETCH_FAILED).allows_stale_fallback());
        assert!(ProviderError::invalid_response("bad json").allows_stale_fallback());
        assert!(!ProviderError::configuration("missing").allows_stale_fallback());
    }

    #[test]
    fn internal_error_is_terminal() {
        let err = ProviderError::internal("failed to create HTTP client: tls");
        assert_eq!(err.code(), ProviderErrorCode::InternalError);
        assert_eq!(err.status(), 500);
        assert!(!err.is_retryable());
        assert!(!err.allows_stale_fallback());
        assert!(err.to_string().contains("internal_error"));
    }

    #[test]
    fn display_includes_code_message_and_status() {
        let err = ProviderError::network(FETCH_FAILED)
            .with_status(503)
            .with_provider("planning_center");
        let display = err.to_string();
        assert!(display.contains("[planning_center]"));
        assert!(display.contains("network_error"));
        assert!(display.contains(FETCH_FAILED));
        assert!(display.contains("503"));
    }

    #[test]
    fn source_is_exposed() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ProviderError::network(FETCH_FAILED).with_source(io_err);
        assert!(err.source().is_some());
    }
}
