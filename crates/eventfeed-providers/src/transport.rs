//! HTTP transport seam.
//!
//! The upstream client never talks to `reqwest` directly; it goes through
//! [`HttpTransport`] so tests can script responses and count calls.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use tracing::trace;

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Keeps [`HttpTransport`] object-safe so it can be shared as
/// `Arc<dyn HttpTransport>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Builder method to append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first header with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully-read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 response carrying the given JSON document.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        self.status >= 500
    }

    /// Returns at most `max_chars` characters of the body, for logging.
    pub fn truncated_body(&self, max_chars: usize) -> &str {
        match self.body.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.body[..idx],
            None => &self.body,
        }
    }
}

/// Something that can perform a GET and hand back status and body.
///
/// A transport error means no response was obtained at all (DNS, TLS,
/// connect, timeout). Any HTTP status, including 5xx, is an `Ok`.
pub trait HttpTransport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn get<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, ProviderResult<HttpResponse>>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    fn get<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, ProviderResult<HttpResponse>> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let response = builder.send().await.map_err(|e| {
                let message = if e.is_timeout() {
                    "request timeout".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {}", e)
                } else {
                    format!("request failed: {}", e)
                };
                ProviderError::network(message).with_source(e)
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                ProviderError::network(format!("failed to read response: {}", e)).with_source(e)
            })?;
            trace!(url = %request.url, status, bytes = body.len(), "response received");

            Ok(HttpResponse { status, body })
        })
    }
}

type Script = dyn Fn(&HttpRequest) -> ProviderResult<HttpResponse> + Send + Sync;

/// A transport that answers from a routing closure and records every URL.
///
/// Useful for tests and for offline runs against canned fixtures.
pub struct ScriptedTransport {
    script: Box<Script>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&HttpRequest) -> ProviderResult<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the requests seen so far, in call order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the URLs requested so far, in call order.
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl HttpTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn get<'a>(&'a self, request: &'a HttpRequest) -> BoxFuture<'a, ProviderResult<HttpResponse>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        let result = (self.script)(request);
        Box::pin(async move { result })
    }
}
