//! Event feed aggregation: cache, configuration, response mapping.
//!
//! This crate ties the upstream plumbing together:
//! - snapshot caching with a freshness window and stale fallback
//! - configuration from the environment with builder overrides
//! - the [`EventFeed`] entry point producing upcoming events
//! - mapping results onto `{status, body}` responses
//!
//! # Example
//!
//! ```rust,no_run
//! use eventfeed_server::{EventFeed, FeedConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = EventFeed::from_config(FeedConfig::from_env())?;
//!     let events = feed.get_events(None).await?;
//!     println!("{} upcoming events", events.len());
//!     Ok(())
//! }
//! ```

mod aggregator;
mod cache;
mod config;
mod error;
mod handler;

pub use aggregator::EventFeed;
pub use cache::{
    CacheSnapshot, DEFAULT_CACHE_KEY, FileCacheStore, MemoryCacheStore, SnapshotStore,
};
pub use config::{ENV_CACHE_DIR, FeedConfig};
pub use error::{FeedError, FeedResult};
pub use handler::{EventsResponse, GENERIC_FAILURE_BODY, handle_events_request};
