//! Client error types.

use std::fmt;

use eventfeed_core::TracingError;
use eventfeed_server::FeedError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Feed could not produce a listing.
    Feed(FeedError),
    /// Output could not be serialized.
    Output(serde_json::Error),
    /// Logging could not be initialised.
    Tracing(TracingError),
}

impl ClientError {
    /// Process exit code: 2 when upstream is temporarily unavailable, 1
    /// otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Feed(err) if err.status() >= 500 => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed(err) => write!(f, "feed error: {}", err),
            Self::Output(err) => write!(f, "output error: {}", err),
            Self::Tracing(err) => write!(f, "tracing error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Feed(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Tracing(err) => Some(err),
        }
    }
}

impl From<FeedError> for ClientError {
    fn from(err: FeedError) -> Self {
        Self::Feed(err)
    }
}

impl From<eventfeed_providers::ProviderError> for ClientError {
    fn from(err: eventfeed_providers::ProviderError) -> Self {
        Self::Feed(FeedError::from(err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err)
    }
}

impl From<TracingError> for ClientError {
    fn from(err: TracingError) -> Self {
        Self::Tracing(err)
    }
}
