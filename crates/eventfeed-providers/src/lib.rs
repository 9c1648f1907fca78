//! Upstream access for the event feed.
//!
//! This crate turns Planning Center's JSON:API responses into
//! [`eventfeed_core::Event`] values:
//!
//! - [`HttpTransport`] - The seam every GET goes through
//! - [`retry_fetch`] - Backoff on transport errors and 5xx
//! - [`PlanningCenterClient`] - URL building, auth, events endpoint
//! - [`ContentPolicy`] - Visibility flag and forbidden-keyword filter
//! - [`normalize_event`] - Raw record to `Event`
//! - [`OccurrenceResolver`] - Next concrete occurrences per event
//!
//! # Architecture
//!
//! ```text
//!   GET events ──► ContentPolicy ──► normalize_events
//!                                          │
//!                                          ▼
//!   GET event_instances ◄────────── OccurrenceResolver
//!   (batch, degraded, per event)           │
//!                                          ▼
//!                                     Vec<Event>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use eventfeed_providers::{ContentPolicy, EventTimeIndex, normalize_events};
//!
//! let doc = client.list_events(12).await?;
//! let index = EventTimeIndex::from_included(&doc.included);
//! let records = ContentPolicy::default().retain_publishable(doc.data.unwrap_or_default());
//! let events = normalize_events(&records, &index);
//! ```

pub mod error;
pub mod normalize;
pub mod planning_center;
pub mod policy;
pub mod raw_event;
pub mod resolve;
pub mod retry;
pub mod transport;

// Re-export main types at crate root
pub use error::{FETCH_FAILED, ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{EventTimeIndex, Occurrence, normalize_event, normalize_events, normalize_instance};
pub use planning_center::{AuthMethod, Credentials, PlanningCenterClient, PlanningCenterConfig};
pub use policy::{ContentPolicy, DEFAULT_FORBIDDEN_KEYWORDS};
pub use raw_event::{JsonApiDocument, RawRecord};
pub use resolve::{OccurrenceResolver, ResolverOptions};
pub use retry::{RetryPolicy, retry_fetch};
pub use transport::{
    BoxFuture, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, ScriptedTransport,
};
