//! Planning Center connection configuration.

use std::fmt;
use std::time::Duration;

use base64::Engine;
use url::Url;

use crate::error::{ProviderError, ProviderResult};

pub const DEFAULT_EVENTS_URL: &str = "https://api.planningcenteronline.com/calendar/v2/events";
pub const DEFAULT_EVENT_INSTANCES_URL: &str =
    "https://api.planningcenteronline.com/calendar/v2/event_instances";

pub const ENV_PAT: &str = "PLANNING_CENTER_PAT";
pub const ENV_CLIENT_ID: &str = "PLANNING_CENTER_CLIENT_ID";
pub const ENV_SECRET: &str = "PLANNING_CENTER_SECRET";
pub const ENV_AUTH_METHOD: &str = "PLANNING_CENTER_AUTH_METHOD";
pub const ENV_EVENTS_URL: &str = "PLANNING_CENTER_EVENTS_URL";
pub const ENV_EVENT_INSTANCES_URL: &str = "PLANNING_CENTER_EVENT_INSTANCES_URL";

/// How a personal access token is presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// `Basic base64(token:)`
    #[default]
    Basic,
    /// `Bearer token`
    Bearer,
}

impl AuthMethod {
    /// Parses a method name; anything other than `bearer` means Basic.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("bearer") {
            Self::Bearer
        } else {
            Self::Basic
        }
    }
}

/// API credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    PersonalAccessToken { token: String, method: AuthMethod },
    ClientCredentials { client_id: String, client_secret: String },
}

impl Credentials {
    /// Reads credentials through `lookup`.
    ///
    /// A complete client id/secret pair wins over a personal access token.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let (Some(client_id), Some(client_secret)) = (get(ENV_CLIENT_ID), get(ENV_SECRET)) {
            return Some(Self::ClientCredentials {
                client_id,
                client_secret,
            });
        }

        get(ENV_PAT).map(|token| Self::PersonalAccessToken {
            token,
            method: get(ENV_AUTH_METHOD)
                .map(|m| AuthMethod::parse(&m))
                .unwrap_or_default(),
        })
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        match self {
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => basic_auth(client_id, client_secret),
            Self::PersonalAccessToken {
                token,
                method: AuthMethod::Bearer,
            } => format!("Bearer {}", token),
            Self::PersonalAccessToken {
                token,
                method: AuthMethod::Basic,
            } => basic_auth(token, ""),
        }
    }

    /// Auth scheme name, safe to log.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::PersonalAccessToken {
                method: AuthMethod::Bearer,
                ..
            } => "Bearer",
            _ => "Basic",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonalAccessToken { method, .. } => f
                .debug_struct("PersonalAccessToken")
                .field("token", &"<redacted>")
                .field("method", method)
                .finish(),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

/// Configuration for the Planning Center client.
#[derive(Debug, Clone)]
pub struct PlanningCenterConfig {
    pub events_url: String,
    pub instances_url: String,
    /// `None` means the feed is not configured.
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for PlanningCenterConfig {
    fn default() -> Self {
        Self {
            events_url: DEFAULT_EVENTS_URL.to_string(),
            instances_url: DEFAULT_EVENT_INSTANCES_URL.to_string(),
            credentials: None,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("eventfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PlanningCenterConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..Self::default()
        }
    }

    /// Builds a configuration from a key lookup, falling back to defaults
    /// for unset URLs.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let url_or = |key: &str, fallback: String| {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or(fallback)
        };
        Self {
            events_url: url_or(ENV_EVENTS_URL, defaults.events_url),
            instances_url: url_or(ENV_EVENT_INSTANCES_URL, defaults.instances_url),
            credentials: Credentials::from_lookup(&lookup),
            ..defaults
        }
    }

    /// Builds a configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with_events_url(mut self, url: impl Into<String>) -> Self {
        self.events_url = url.into();
        self
    }

    pub fn with_instances_url(mut self, url: impl Into<String>) -> Self {
        self.instances_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Checks that both endpoint URLs parse.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending URL.
    pub fn validate(&self) -> ProviderResult<()> {
        for (name, value) in [
            ("events URL", &self.events_url),
            ("event instances URL", &self.instances_url),
        ] {
            Url::parse(value).map_err(|e| {
                ProviderError::configuration(format!("invalid {} {:?}: {}", name, value, e))
                    .with_source(e)
            })?;
        }
        Ok(())
    }
}
