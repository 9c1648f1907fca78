//! The event feed entry point.
//!
//! [`EventFeed::get_events`] returns the public listing:
//! - credentials missing: fail with [`FeedError::NotConfigured`]
//! - fresh snapshot: serve it without touching the network
//! - otherwise: fetch, filter, normalize, resolve occurrences, keep only
//!   upcoming events, persist, return
//! - upstream unavailable: serve any snapshot, however old

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventfeed_core::Event;
use eventfeed_providers::{
    ContentPolicy, EventTimeIndex, HttpTransport, OccurrenceResolver, PlanningCenterClient,
    ProviderResult, ReqwestTransport, normalize_events,
};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheSnapshot, FileCacheStore, SnapshotStore};
use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};

/// Aggregates the upstream calendar into a list of upcoming events.
pub struct EventFeed {
    config: FeedConfig,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SnapshotStore>,
    policy: ContentPolicy,
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl EventFeed {
    /// Creates a feed over the given transport and snapshot store.
    pub fn new(
        config: FeedConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let policy = ContentPolicy::new(&config.forbidden_keywords);
        Self {
            config,
            transport,
            store,
            policy,
        }
    }

    /// Creates a feed backed by `reqwest` and a file store in
    /// `config.cache_dir`.
    ///
    /// # Errors
    ///
    /// Fails if the configured URLs do not parse or the HTTP client cannot
    /// be built.
    pub fn from_config(config: FeedConfig) -> FeedResult<Self> {
        config.planning_center.validate()?;
        let transport = ReqwestTransport::new(
            config.planning_center.timeout,
            &config.planning_center.user_agent,
        )?;
        let store = FileCacheStore::new(config.cache_dir.clone());
        Ok(Self::new(config, Arc::new(transport), Arc::new(store)))
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Returns upcoming events, `per_page` defaulting to the configured size.
    pub async fn get_events(&self, per_page: Option<usize>) -> FeedResult<Vec<Event>> {
        self.get_events_at(per_page, Utc::now()).await
    }

    /// Like [`get_events`](Self::get_events) with an explicit clock.
    pub async fn get_events_at(
        &self,
        per_page: Option<usize>,
        now: DateTime<Utc>,
    ) -> FeedResult<Vec<Event>> {
        if !self.config.planning_center.is_configured() {
            warn!("Planning Center credentials not configured");
            return Err(FeedError::NotConfigured);
        }

        let key = self.config.cache_key.as_str();
        let cached = self.store.read(key);
        if let Some(snapshot) = cached.as_ref() {
            let age_minutes = snapshot.age(now).num_minutes();
            if snapshot.is_fresh(self.config.cache_ttl, now) {
                debug!(age_minutes, events = snapshot.events.len(), "serving fresh cache snapshot");
                return Ok(snapshot.events.clone());
            }
            debug!(age_minutes, "cache snapshot expired, fetching");
        }

        let per_page = per_page.unwrap_or(self.config.per_page);
        match self.fetch_upcoming(per_page, now).await {
            Ok(None) => Ok(Vec::new()),
            Ok(Some(events)) => {
                let snapshot = CacheSnapshot::new(events, now);
                if let Err(err) = self.store.write(key, &snapshot) {
                    warn!(error = %err, "failed to write cache snapshot");
                }
                info!(events = snapshot.events.len(), "aggregated upcoming events");
                Ok(snapshot.events)
            }
            Err(err) if err.allows_stale_fallback() => match cached {
                Some(snapshot) => {
                    warn!(
                        error = %err,
                        snapshot_ts = %snapshot.ts,
                        age_minutes = snapshot.age(now).num_minutes(),
                        "upstream failed, serving stale cache snapshot"
                    );
                    Ok(snapshot.events)
                }
                None => {
                    error!(error = %err, "upstream failed and no cache snapshot exists");
                    Err(err.into())
                }
            },
            Err(err) => {
                error!(error = %err, status = err.status(), "upstream rejected request");
                Err(err.into())
            }
        }
    }

    /// Runs the live pipeline. `Ok(None)` means the document had no `data`.
    async fn fetch_upcoming(
        &self,
        per_page: usize,
        now: DateTime<Utc>,
    ) -> ProviderResult<Option<Vec<Event>>> {
        let client = PlanningCenterClient::new(
            &self.config.planning_center,
            Arc::clone(&self.transport),
            self.config.retry,
        )?;

        let document = client.list_events(per_page).await?;
        let Some(records) = document.data else {
            debug!("events response has no data");
            return Ok(None);
        };
        let index = EventTimeIndex::from_included(&document.included);

        let total = records.len();
        let publishable = self.policy.retain_publishable(records);
        let events = normalize_events(&publishable, &index);
        debug!(
            total,
            publishable = publishable.len(),
            normalized = events.len(),
            event_times = index.len(),
            "normalized events"
        );

        let resolver = OccurrenceResolver::new(&client, self.config.resolver);
        let events = resolver.resolve(events, now).await;

        let resolved = events.len();
        let upcoming: Vec<Event> = events.into_iter().filter(|e| e.is_upcoming(now)).collect();
        debug!(resolved, upcoming = upcoming.len(), "filtered to upcoming events");
        Ok(Some(upcoming))
    }
}
