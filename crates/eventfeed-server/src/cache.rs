//! Snapshot cache for the event listing.
//!
//! A snapshot is the last successfully aggregated list plus the time it was
//! taken. It serves two purposes: a fresh snapshot short-circuits the whole
//! upstream pipeline, and a stale one stands in when the upstream is down.
//!
//! Snapshots live under a key so unrelated listings can share one store.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use eventfeed_core::Event;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{FeedError, FeedResult};

/// Key of the event listing snapshot.
pub const DEFAULT_CACHE_KEY: &str = "pco-events-cache";

/// A persisted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// When the listing was fetched.
    pub ts: DateTime<Utc>,
    pub events: Vec<Event>,
}

impl CacheSnapshot {
    pub fn new(events: Vec<Event>, ts: DateTime<Utc>) -> Self {
        Self { ts, events }
    }

    /// Age at `now`; negative if `ts` lies in the future.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.ts
    }

    /// True when the snapshot is younger than `ttl` at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => self.age(now) < ttl,
            Err(_) => true,
        }
    }
}

/// Keyed snapshot storage.
///
/// Reads never fail: a missing, unreadable or malformed snapshot is simply
/// absent.
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> Option<CacheSnapshot>;

    /// Replaces the snapshot under `key`.
    fn write(&self, key: &str, snapshot: &CacheSnapshot) -> FeedResult<()>;
}

/// Stores each snapshot as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileCacheStore {
    fn read(&self, key: &str) -> Option<CacheSnapshot> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                trace!(path = %path.display(), error = %e, "no cache snapshot");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring malformed cache snapshot");
                None
            }
        }
    }

    fn write(&self, key: &str, snapshot: &CacheSnapshot) -> FeedResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| FeedError::cache(&self.dir, e))?;

        let path = self.path_for(key);
        let content = serde_json::to_string(snapshot)
            .map_err(|e| FeedError::cache(&path, std::io::Error::other(e)))?;

        // Temp file then rename, so readers never see a partial snapshot.
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| FeedError::cache(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| FeedError::cache(&path, e))?;

        debug!(path = %path.display(), events = snapshot.events.len(), "wrote cache snapshot");
        Ok(())
    }
}

/// In-process store; nothing outlives the value.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, CacheSnapshot>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a snapshot.
    pub fn with_snapshot(self, key: impl Into<String>, snapshot: CacheSnapshot) -> Self {
        self.lock().insert(key.into(), snapshot);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheSnapshot>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemoryCacheStore {
    fn read(&self, key: &str) -> Option<CacheSnapshot> {
        self.lock().get(key).cloned()
    }

    fn write(&self, key: &str, snapshot: &CacheSnapshot) -> FeedResult<()> {
        self.lock().insert(key.to_string(), snapshot.clone());
        Ok(())
    }
}
