//! Feed error types.

use std::io;
use std::path::PathBuf;

use eventfeed_providers::ProviderError;
use thiserror::Error;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced by the aggregator and the cache store.
#[derive(Debug, Error)]
pub enum FeedError {
    /// No credentials were configured.
    #[error("Planning Center credentials not configured")]
    NotConfigured,

    /// Upstream failure with no usable snapshot.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Snapshot could not be persisted.
    #[error("cache error at {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FeedError {
    /// Creates a cache error for the given path.
    pub fn cache(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Cache {
            path: path.into(),
            source,
        }
    }

    /// HTTP status tag for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotConfigured => 503,
            Self::Provider(err) => err.status(),
            Self::Cache { .. } => 500,
        }
    }

    /// Upstream body or transport detail, when there is one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Provider(err) => err.body(),
            _ => None,
        }
    }

    /// Human-readable message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            Self::Provider(err) => err.message().to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventfeed_providers::FETCH_FAILED;

    #[test]
    fn not_configured_is_503() {
        let err = FeedError::NotConfigured;
        assert_eq!(err.status(), 503);
        assert!(err.to_string().contains("credentials not configured"));
        assert!(err.body().is_none());
    }

    #[test]
    fn provider_status_is_delegated() {
        let err: FeedError = ProviderError::client(404, "Planning Center API error")
            .with_body("missing")
            .into();
        assert_eq!(err.status(), 404);
        assert_eq!(err.body(), Some("missing"));
        assert_eq!(err.message(), "Planning Center API error");

        let err: FeedError = ProviderError::network(FETCH_FAILED).with_status(503).into();
        assert_eq!(err.status(), 503);
        assert!(err.to_string().contains(FETCH_FAILED));
    }

    #[test]
    fn cache_error_mentions_path() {
        let err = FeedError::cache("/tmp/x.json", io::Error::other("disk full"));
        assert_eq!(err.status(), 500);
        assert!(err.to_string().contains("/tmp/x.json"));
        assert!(err.to_string().contains("disk full"));
    }
}
