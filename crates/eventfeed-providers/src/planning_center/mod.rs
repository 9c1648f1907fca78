//! Planning Center Calendar API.
//!
//! Two endpoints are used: `events` for the listing itself and
//! `event_instances` for concrete occurrences. Both speak JSON:API.

mod client;
mod config;

pub use client::{JSON_API_ACCEPT, PROVIDER_NAME, PlanningCenterClient, with_query};
pub use config::{
    AuthMethod, Credentials, DEFAULT_EVENT_INSTANCES_URL, DEFAULT_EVENTS_URL, ENV_AUTH_METHOD,
    ENV_CLIENT_ID, ENV_EVENT_INSTANCES_URL, ENV_EVENTS_URL, ENV_PAT, ENV_SECRET,
    PlanningCenterConfig,
};
