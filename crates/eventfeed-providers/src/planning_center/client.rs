//! Planning Center Calendar API client.
//!
//! Builds request URLs, attaches auth and JSON:API headers, and runs every
//! GET through [`retry_fetch`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::JsonApiDocument;
use crate::retry::{RetryPolicy, retry_fetch};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

use super::config::PlanningCenterConfig;

/// Media type requested on every call.
pub const JSON_API_ACCEPT: &str = "application/vnd.api+json";

/// Provider name attached to errors.
pub const PROVIDER_NAME: &str = "planning_center";

/// Characters of the events endpoint's error body kept in logs.
const LOGGED_EVENTS_BODY_CHARS: usize = 1000;

/// Appends already-encoded query pairs, joining with `&` when `base` already
/// carries a query.
pub fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    let joiner = if base.contains('?') { '&' } else { '?' };
    format!("{}{}{}", base, joiner, query)
}

/// Authenticated client for the events and event-instances endpoints.
pub struct PlanningCenterClient {
    transport: Arc<dyn HttpTransport>,
    events_url: String,
    instances_url: String,
    authorization: String,
    auth_scheme: &'static str,
    retry: RetryPolicy,
}

impl std::fmt::Debug for PlanningCenterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanningCenterClient")
            .field("transport", &self.transport.name())
            .field("events_url", &self.events_url)
            .field("instances_url", &self.instances_url)
            .field("auth_scheme", &self.auth_scheme)
            .field("retry", &self.retry)
            .finish()
    }
}

impl PlanningCenterClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error tagged 503 when no credentials are set.
    pub fn new(
        config: &PlanningCenterConfig,
        transport: Arc<dyn HttpTransport>,
        retry: RetryPolicy,
    ) -> ProviderResult<Self> {
        let credentials = config.credentials.as_ref().ok_or_else(|| {
            ProviderError::configuration("Planning Center credentials not configured")
                .with_status(503)
                .with_provider(PROVIDER_NAME)
        })?;

        Ok(Self {
            transport,
            events_url: config.events_url.clone(),
            instances_url: config.instances_url.clone(),
            authorization: credentials.authorization_header(),
            auth_scheme: credentials.scheme(),
            retry,
        })
    }

    /// `GET events` URL for visible events with their event times side-loaded.
    pub fn events_url(&self, per_page: usize) -> String {
        let per_page = per_page.to_string();
        with_query(
            &self.events_url,
            &[
                ("filter[visible_in_church_center]", "true"),
                ("per_page", per_page.as_str()),
                ("include", "event_times"),
            ],
        )
    }

    /// Batch URL for approved instances starting on or after `today`.
    ///
    /// With `include_related` unset the `include` parameter is dropped, which
    /// is the lighter request used after the full one fails with a 5xx.
    pub fn batch_instances_url(&self, today: &str, per_page: usize, include_related: bool) -> String {
        let per_page = per_page.to_string();
        let mut params = vec![
            ("filter", "approved"),
            ("where[starts_at][gte]", today),
            ("per_page", per_page.as_str()),
            ("order", "starts_at"),
        ];
        if include_related {
            params.push(("include", "event_times,event"));
        }
        with_query(&self.instances_url, &params)
    }

    /// Instances URL scoped to a single event.
    pub fn event_instances_url(&self, event_id: &str, today: &str, per_page: usize) -> String {
        let per_page = per_page.to_string();
        let event_id = urlencoding::encode(event_id);
        with_query(
            &self.instances_url,
            &[
                ("filter[event]", &*event_id),
                ("filter", "approved"),
                ("where[starts_at][gte]", today),
                ("per_page", per_page.as_str()),
                ("order", "starts_at"),
                ("include", "event_times,event"),
            ],
        )
    }

    fn request(&self, url: &str) -> HttpRequest {
        HttpRequest::new(url)
            .with_header("Authorization", self.authorization.as_str())
            .with_header("Accept", JSON_API_ACCEPT)
    }

    /// Retrying GET with auth headers; non-5xx statuses come back as `Ok`.
    pub async fn fetch(&self, url: &str) -> ProviderResult<HttpResponse> {
        let request = self.request(url);
        retry_fetch(self.transport.as_ref(), &request, &self.retry)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }

    /// Fetches the primary events document.
    ///
    /// # Errors
    ///
    /// - exhausted retries: network or server error tagged 503
    /// - any other non-2xx: client error carrying the upstream status and body
    /// - unparsable body or non-array `data`: invalid response
    pub async fn list_events(&self, per_page: usize) -> ProviderResult<JsonApiDocument> {
        let url = self.events_url(per_page);
        debug!(url = %url, auth = self.auth_scheme, "fetching events");

        let response = self.fetch(&url).await?;
        if !response.is_success() {
            warn!(
                status = response.status,
                body = response.truncated_body(LOGGED_EVENTS_BODY_CHARS),
                "events request rejected"
            );
            return Err(
                ProviderError::client(response.status, "Planning Center API error")
                    .with_body(response.body)
                    .with_provider(PROVIDER_NAME),
            );
        }

        JsonApiDocument::parse(&response.body).map_err(|e| e.with_provider(PROVIDER_NAME))
    }
}
