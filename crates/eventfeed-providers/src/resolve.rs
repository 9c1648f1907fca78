//! Occurrence resolution for recurring events.
//!
//! The `events` endpoint gives series, not dates. This module finds, for each
//! event, its next few concrete occurrences:
//!
//! 1. One batch request for all approved instances from today on, grouped by
//!    parent event. If it fails with a 5xx, one lighter request without
//!    side-loads is tried.
//! 2. For events the batch left without occurrences, one scoped request per
//!    event, run with bounded concurrency. Upcoming occurrences are preferred;
//!    if there are none, whatever came back is used.
//!
//! Every failure here is logged and absorbed. The worst outcome is events
//! with empty `instances`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use eventfeed_core::{Event, Instance, utc_date_stamp};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::error::{ProviderErrorCode, ProviderResult};
use crate::normalize::{EventTimeIndex, Occurrence, normalize_instance};
use crate::planning_center::PlanningCenterClient;
use crate::raw_event::JsonApiDocument;
use crate::transport::HttpResponse;

/// Characters of an instances error body kept in logs.
const LOGGED_BODY_CHARS: usize = 400;

/// Tuning knobs for [`OccurrenceResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Occurrences kept per event.
    pub instance_limit: usize,
    pub batch_page_size: usize,
    /// Page size of the lighter retry after a failed batch.
    pub degraded_page_size: usize,
    pub per_event_page_size: usize,
    /// Per-event lookups in flight at once.
    pub lookup_concurrency: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            instance_limit: 6,
            batch_page_size: 400,
            degraded_page_size: 100,
            per_event_page_size: 100,
            lookup_concurrency: 4,
        }
    }
}

/// Attaches upcoming occurrences to events.
#[derive(Debug)]
pub struct OccurrenceResolver<'a> {
    client: &'a PlanningCenterClient,
    options: ResolverOptions,
}

impl<'a> OccurrenceResolver<'a> {
    pub fn new(client: &'a PlanningCenterClient, options: ResolverOptions) -> Self {
        Self { client, options }
    }

    /// Resolves occurrences for `events`, preserving their order.
    ///
    /// Each returned event has `instances` set (possibly empty). When at
    /// least one occurrence was found, `next_instance_starts_at` is the
    /// earliest chosen one and a missing `starts_at` is backfilled from it.
    pub async fn resolve(&self, events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
        let today = utc_date_stamp(now);
        let mut by_event = self.batch_occurrences(&today).await;

        let missing: Vec<String> = events
            .iter()
            .filter(|e| by_event.get(&e.id).is_none_or(Vec::is_empty))
            .map(|e| e.id.clone())
            .collect();

        if !missing.is_empty() {
            debug!(count = missing.len(), "looking up instances per event");
            let today = today.as_str();
            let lookups: Vec<(String, ProviderResult<Vec<Occurrence>>)> = stream::iter(missing)
                .map(|id| async move {
                    let result = self.lookup_event(&id, today, now).await;
                    (id, result)
                })
                .buffered(self.options.lookup_concurrency.max(1))
                .collect()
                .await;

            for (id, result) in lookups {
                match result {
                    Ok(found) if !found.is_empty() => {
                        by_event.insert(id, found);
                    }
                    Ok(_) => debug!(event_id = %id, "no instances found"),
                    Err(err) => warn!(event_id = %id, error = %err, "instance lookup failed"),
                }
            }
        }

        events
            .into_iter()
            .map(|event| {
                let found = by_event.remove(&event.id).unwrap_or_default();
                attach(event, found)
            })
            .collect()
    }

    async fn batch_occurrences(&self, today: &str) -> HashMap<String, Vec<Occurrence>> {
        let url = self
            .client
            .batch_instances_url(today, self.options.batch_page_size, true);

        let document = match self.client.fetch(&url).await {
            Ok(response) => self.document_or_log(response, "batch"),
            Err(err) if err.code() == ProviderErrorCode::ServerError => {
                warn!(error = %err, "batch instance fetch failed, retrying without includes");
                self.degraded_batch(today).await
            }
            Err(err) => {
                warn!(error = %err, "batch instance fetch failed");
                None
            }
        };

        let Some(document) = document else {
            return HashMap::new();
        };
        let grouped = group_by_event(&document, self.options.instance_limit);
        debug!(events = grouped.len(), "grouped batch instances");
        grouped
    }

    async fn degraded_batch(&self, today: &str) -> Option<JsonApiDocument> {
        let url = self
            .client
            .batch_instances_url(today, self.options.degraded_page_size, false);
        match self.client.fetch(&url).await {
            Ok(response) => self.document_or_log(response, "degraded batch"),
            Err(err) => {
                warn!(error = %err, "degraded batch instance fetch failed");
                None
            }
        }
    }

    fn document_or_log(&self, response: HttpResponse, stage: &str) -> Option<JsonApiDocument> {
        if !response.is_success() {
            warn!(
                stage,
                status = response.status,
                body = response.truncated_body(LOGGED_BODY_CHARS),
                "instances request rejected"
            );
            return None;
        }
        match JsonApiDocument::parse(&response.body) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!(stage, error = %err, "instances response unreadable");
                None
            }
        }
    }

    async fn lookup_event(
        &self,
        event_id: &str,
        today: &str,
        now: DateTime<Utc>,
    ) -> ProviderResult<Vec<Occurrence>> {
        let url = self
            .client
            .event_instances_url(event_id, today, self.options.per_event_page_size);
        let response = self.client.fetch(&url).await?;
        if !response.is_success() {
            debug!(
                event_id,
                status = response.status,
                body = response.truncated_body(LOGGED_BODY_CHARS),
                "per-event instances request rejected"
            );
            return Ok(Vec::new());
        }

        let document = JsonApiDocument::parse(&response.body)?;
        let index = EventTimeIndex::from_included(&document.included);
        let mut all: Vec<Occurrence> = document
            .records()
            .iter()
            .filter_map(|raw| normalize_instance(raw, &index))
            .collect();
        all.sort_by_key(|o| o.start);

        let upcoming: Vec<Occurrence> = all.iter().filter(|o| o.start >= now).cloned().collect();
        let mut chosen = if upcoming.is_empty() { all } else { upcoming };
        chosen.truncate(self.options.instance_limit);
        Ok(chosen)
    }
}

/// Groups instance records by parent event, ascending by start, truncated.
///
/// Records without a parent reference or a parsable start are dropped.
fn group_by_event(document: &JsonApiDocument, limit: usize) -> HashMap<String, Vec<Occurrence>> {
    let index = EventTimeIndex::from_included(&document.included);
    let mut grouped: HashMap<String, Vec<Occurrence>> = HashMap::new();
    for raw in document.records() {
        let Some(occurrence) = normalize_instance(raw, &index) else {
            continue;
        };
        let Some(event_id) = occurrence.event_id.clone() else {
            continue;
        };
        grouped.entry(event_id).or_default().push(occurrence);
    }
    for list in grouped.values_mut() {
        list.sort_by_key(|o| o.start);
        list.truncate(limit);
    }
    grouped
}

fn attach(mut event: Event, occurrences: Vec<Occurrence>) -> Event {
    let earliest = occurrences.first().map(|o| o.start_at.clone());
    if event.starts_at.is_none() {
        event.starts_at = earliest.clone();
    }
    event.next_instance_starts_at = earliest;
    event.instances = Some(occurrences.into_iter().map(Instance::from).collect());
    event
}
