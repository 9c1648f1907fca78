//! Retrying GET wrapper with exponential backoff.

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{FETCH_FAILED, ProviderError, ProviderResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Characters of an upstream error body kept in logs.
const LOGGED_BODY_CHARS: usize = 400;

/// How many times, and how patiently, a failed GET is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`.
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_backoff: Duration) -> Self {
        Self {
            max_retries,
            base_backoff,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn no_retries() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Performs a GET, retrying transport failures and 5xx responses.
///
/// - Any status below 500 is returned to the caller as-is, without retry.
/// - A 5xx on the last attempt becomes a [`ServerError`] tagged 503.
/// - A transport error on the last attempt becomes a [`NetworkError`] tagged
///   503 whose body is the stringified cause.
///
/// Both exhausted outcomes use the message [`FETCH_FAILED`].
///
/// [`ServerError`]: crate::error::ProviderErrorCode::ServerError
/// [`NetworkError`]: crate::error::ProviderErrorCode::NetworkError
pub async fn retry_fetch(
    transport: &dyn HttpTransport,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> ProviderResult<HttpResponse> {
    let mut attempt: u32 = 0;
    loop {
        match transport.get(request).await {
            Ok(response) if response.is_server_error() => {
                if attempt < policy.max_retries {
                    let delay = policy.delay_for(attempt);
                    debug!(
                        url = %request.url,
                        status = response.status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "upstream 5xx, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                warn!(
                    url = %request.url,
                    status = response.status,
                    body = response.truncated_body(LOGGED_BODY_CHARS),
                    "upstream 5xx after retries"
                );
                return Err(ProviderError::server(FETCH_FAILED)
                    .with_status(503)
                    .with_body(format!(
                        "upstream status {}: {}",
                        response.status, response.body
                    )));
            }
            Ok(response) => return Ok(response),
            Err(err) => {
                if attempt < policy.max_retries {
                    let delay = policy.delay_for(attempt);
                    debug!(
                        url = %request.url,
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "transport error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                warn!(url = %request.url, error = %err, "transport error after retries");
                return Err(ProviderError::network(FETCH_FAILED)
                    .with_status(503)
                    .with_body(err.to_string())
                    .with_source(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::transport::ScriptedTransport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn request() -> HttpRequest {
        HttpRequest::new("https://api.example.test/events")
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(300));
        assert_eq!(policy.delay_for(1), Duration::from_millis(600));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_transport_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let transport = ScriptedTransport::new(move |_| {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ProviderError::network("connection reset"))
            } else {
                Ok(HttpResponse::new(200, r#"{"data":[]}"#))
            }
        });

        let response = retry_fetch(&transport, &request(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transport_errors_become_network_error() {
        let transport = ScriptedTransport::new(|_| Err(ProviderError::network("dns failure")));

        let err = retry_fetch(&transport, &request(), &RetryPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(err.status(), 503);
        assert_eq!(err.message(), FETCH_FAILED);
        assert!(err.body().unwrap().contains("dns failure"));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_5xx_becomes_server_error() {
        let transport = ScriptedTransport::new(|_| Ok(HttpResponse::new(502, "bad gateway")));

        let err = retry_fetch(&transport, &request(), &RetryPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert_eq!(err.status(), 503);
        assert!(err.body().unwrap().contains("502"));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::new(|_| Ok(HttpResponse::new(404, "not found")));

        let response = retry_fetch(&transport, &request(), &RetryPolicy::default())
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_makes_one_attempt() {
        let transport = ScriptedTransport::new(|_| Ok(HttpResponse::new(500, "boom")));

        let err = retry_fetch(&transport, &request(), &RetryPolicy::no_retries())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert_eq!(transport.call_count(), 1);
    }
}
