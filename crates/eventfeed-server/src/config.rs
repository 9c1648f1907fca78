//! Feed configuration.

use std::path::PathBuf;
use std::time::Duration;

use eventfeed_providers::{
    DEFAULT_FORBIDDEN_KEYWORDS, PlanningCenterConfig, ResolverOptions, RetryPolicy,
};

use crate::cache::DEFAULT_CACHE_KEY;

/// Environment variable overriding the cache directory.
pub const ENV_CACHE_DIR: &str = "EVENTFEED_CACHE_DIR";

/// Aggregator configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub planning_center: PlanningCenterConfig,

    /// Directory holding cache snapshots.
    pub cache_dir: PathBuf,

    pub cache_key: String,

    /// Snapshots younger than this are served without contacting upstream.
    pub cache_ttl: Duration,

    /// Page size when the caller does not pass one.
    pub per_page: usize,

    pub resolver: ResolverOptions,

    pub retry: RetryPolicy,

    pub forbidden_keywords: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            planning_center: PlanningCenterConfig::default(),
            cache_dir: PathBuf::from("logs"),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: Duration::from_secs(Self::DEFAULT_CACHE_TTL_SECS),
            per_page: Self::DEFAULT_PER_PAGE,
            resolver: ResolverOptions::default(),
            retry: RetryPolicy::default(),
            forbidden_keywords: DEFAULT_FORBIDDEN_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl FeedConfig {
    /// Six hours.
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 6 * 60 * 60;

    pub const DEFAULT_PER_PAGE: usize = 12;

    /// Creates a configuration around the given upstream settings.
    pub fn new(planning_center: PlanningCenterConfig) -> Self {
        Self {
            planning_center,
            ..Default::default()
        }
    }

    /// Reads upstream settings and the cache directory through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(PlanningCenterConfig::from_lookup(&lookup));
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|d| !d.is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }
        config
    }

    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builder: set cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Builder: set cache key.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    /// Builder: set cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder: set default page size.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Builder: set how many occurrences are kept per event.
    pub fn with_instance_limit(mut self, limit: usize) -> Self {
        self.resolver.instance_limit = limit;
        self
    }

    /// Builder: set per-event lookup concurrency.
    pub fn with_lookup_concurrency(mut self, concurrency: usize) -> Self {
        self.resolver.lookup_concurrency = concurrency;
        self
    }

    /// Builder: set retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder: replace the forbidden keyword list.
    pub fn with_forbidden_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}
