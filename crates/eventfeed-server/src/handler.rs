//! Maps aggregator results onto HTTP-shaped responses.

use eventfeed_core::Event;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::aggregator::EventFeed;
use crate::error::{FeedError, FeedResult};

/// Body returned for failures when details are hidden.
pub const GENERIC_FAILURE_BODY: &str = "Planning Center request failed";

/// A status code and JSON body ready to be written by a web layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EventsResponse {
    pub status: u16,
    pub body: Value,
}

impl EventsResponse {
    /// Builds the response for an aggregator result.
    ///
    /// Success is `200 {"events": [...]}`. Failure is
    /// `<status> {"error": true, "status": <status>, "body": ...}`, where the
    /// body is the upstream detail when `expose_details` is set and a
    /// generic message otherwise.
    pub fn from_result(result: FeedResult<Vec<Event>>, expose_details: bool) -> Self {
        match result {
            Ok(events) => Self::success(&events),
            Err(err) => Self::failure(&err, expose_details),
        }
    }

    pub fn success(events: &[Event]) -> Self {
        Self {
            status: 200,
            body: json!({ "events": events }),
        }
    }

    pub fn failure(err: &FeedError, expose_details: bool) -> Self {
        let status = err.status();
        let body = if expose_details {
            err.body()
                .map(str::to_string)
                .unwrap_or_else(|| err.message())
        } else {
            GENERIC_FAILURE_BODY.to_string()
        };
        Self {
            status,
            body: json!({ "error": true, "status": status, "body": body }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for 5xx statuses, which a listing page shows as "try again
    /// later" rather than as a hard error.
    pub fn is_temporarily_unavailable(&self) -> bool {
        self.status >= 500
    }

    /// Events carried by a success body.
    pub fn events(&self) -> Option<Vec<Event>> {
        let events = self.body.get("events")?;
        serde_json::from_value(events.clone()).ok()
    }
}

/// Runs one aggregation and maps it to a response.
pub async fn handle_events_request(
    feed: &EventFeed,
    per_page: Option<usize>,
    expose_details: bool,
) -> EventsResponse {
    let result = feed.get_events(per_page).await;
    let response = EventsResponse::from_result(result, expose_details);
    if response.is_success() {
        debug!(status = response.status, "events request served");
    } else {
        warn!(status = response.status, "events request failed");
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventfeed_providers::{FETCH_FAILED, ProviderError};

    #[test]
    fn success_body() {
        let events = vec![Event::new("e1", "Potluck").with_starts_at("2025-02-01T18:00:00Z")];
        let response = EventsResponse::from_result(Ok(events.clone()), false);

        assert_eq!(response.status, 200);
        assert!(response.is_success());
        assert!(!response.is_temporarily_unavailable());
        assert_eq!(response.body["events"][0]["title"], "Potluck");
        assert_eq!(response.body["events"][0]["startsAt"], "2025-02-01T18:00:00Z");
        assert_eq!(response.events(), Some(events));
    }

    #[test]
    fn empty_list_is_success() {
        let response = EventsResponse::from_result(Ok(Vec::new()), false);
        assert_eq!(response.body, json!({ "events": [] }));
    }

    #[test]
    fn unavailable_with_details() {
        let err: FeedError = ProviderError::network(FETCH_FAILED)
            .with_status(503)
            .with_body("connect timeout")
            .into();
        let response = EventsResponse::from_result(Err(err), true);

        assert_eq!(response.status, 503);
        assert!(response.is_temporarily_unavailable());
        assert_eq!(
            response.body,
            json!({ "error": true, "status": 503, "body": "connect timeout" })
        );
        assert!(response.events().is_none());
    }

    #[test]
    fn details_fall_back_to_message() {
        let response = EventsResponse::from_result(Err(FeedError::NotConfigured), true);
        assert_eq!(response.status, 503);
        assert_eq!(response.body["body"], "Planning Center credentials not configured");
    }

    #[test]
    fn hidden_details_use_generic_body() {
        let err: FeedError = ProviderError::client(403, "Planning Center API error")
            .with_body("{\"errors\":[{\"code\":\"forbidden\"}]}")
            .into();
        let response = EventsResponse::from_result(Err(err), false);

        assert_eq!(response.status, 403);
        assert!(!response.is_success());
        assert!(!response.is_temporarily_unavailable());
        assert_eq!(response.body["body"], GENERIC_FAILURE_BODY);
        assert_eq!(response.body["error"], true);
    }

    #[tokio::test]
    async fn unconfigured_feed_maps_to_503() {
        use crate::cache::MemoryCacheStore;
        use crate::config::FeedConfig;
        use eventfeed_providers::{HttpResponse, ScriptedTransport};
        use std::sync::Arc;

        let transport = Arc::new(ScriptedTransport::new(|_| Ok(HttpResponse::new(200, "{}"))));
        let feed = EventFeed::new(
            FeedConfig::default(),
            transport.clone(),
            Arc::new(MemoryCacheStore::new()),
        );

        let response = handle_events_request(&feed, None, false).await;
        assert_eq!(response.status, 503);
        assert_eq!(response.body["body"], GENERIC_FAILURE_BODY);
        assert_eq!(transport.call_count(), 0);
    }
}
