//! Command-line interface definition.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use eventfeed_core::{FormatOptions, RangeStyle};
use eventfeed_server::FeedConfig;

/// eventfeed - Upcoming events from Planning Center
#[derive(Debug, Parser)]
#[command(name = "eventfeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Output flags ---
    /// Print the response body as JSON
    #[arg(long)]
    pub json: bool,

    /// Include upstream error details in JSON failures
    #[arg(long, requires = "json")]
    pub details: bool,

    /// Date range style
    #[arg(long, value_enum, default_value_t = Style::Compact)]
    pub style: Style,

    /// IANA time zone for rendered times (system zone when unset)
    #[arg(long, env = "EVENTFEED_TIMEZONE")]
    pub timezone: Option<String>,

    /// Locale tag for rendered times
    #[arg(long)]
    pub locale: Option<String>,

    /// Text to show when there are no upcoming events
    #[arg(long, default_value = "No upcoming events")]
    pub no_events_text: String,

    // --- Feed flags ---
    /// Number of events requested from upstream
    #[arg(long)]
    pub per_page: Option<usize>,

    /// Directory holding the cache snapshot
    #[arg(long, env = "EVENTFEED_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Minutes a snapshot is served without refetching
    #[arg(long)]
    pub cache_ttl_minutes: Option<u64>,

    /// Occurrences kept per event
    #[arg(long)]
    pub instance_limit: Option<usize>,

    /// Keyword that hides an event (can be repeated; replaces the defaults)
    #[arg(long = "forbid", action = clap::ArgAction::Append)]
    pub forbidden_keywords: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Style {
    /// `Jan 2, 10:00 AM`
    Compact,
    /// `January 2, 2025 at 10am`
    Long,
}

impl From<Style> for RangeStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Compact => RangeStyle::Compact,
            Style::Long => RangeStyle::Long,
        }
    }
}

impl Cli {
    /// Formatting options from the display flags.
    pub fn format_options(&self) -> FormatOptions {
        let mut opts = FormatOptions::new().with_style(self.style.into());
        if let Some(ref tz) = self.timezone {
            opts = opts.with_time_zone(tz.as_str());
        }
        if let Some(ref locale) = self.locale {
            opts = opts.with_locale(locale.as_str());
        }
        opts
    }

    /// Applies feed flags on top of `config`.
    pub fn apply(&self, mut config: FeedConfig) -> FeedConfig {
        if let Some(ref dir) = self.cache_dir {
            config = config.with_cache_dir(dir.clone());
        }
        if let Some(minutes) = self.cache_ttl_minutes {
            config = config.with_cache_ttl(Duration::from_secs(minutes.saturating_mul(60)));
        }
        if let Some(limit) = self.instance_limit {
            config = config.with_instance_limit(limit);
        }
        if !self.forbidden_keywords.is_empty() {
            config = config.with_forbidden_keywords(self.forbidden_keywords.iter().cloned());
        }
        if let Some(per_page) = self.per_page {
            config = config.with_per_page(per_page);
        }
        config
    }
}
