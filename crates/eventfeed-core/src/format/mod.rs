//! Human-readable formatting for event times.
//!
//! Two display styles are supported:
//! - **Compact** (default): `Jan 2, 10:00 AM`, `Jan 2, 10:00 AM — 12:30 PM`
//! - **Long**: `December 18, 2025 at 10am`, `December 18, 2025 at 10am-2pm`
//!
//! Whether a range collapses onto a single date is decided by comparing UTC
//! calendar days, not local ones. The display zone only affects the rendered
//! wall-clock values.
//!
//! Month and meridiem names are English. The `locale` option is accepted for
//! call-site compatibility but every tag renders the `en-US` way.
//!
//! # Example
//!
//! ```rust
//! use eventfeed_core::format::{FormatOptions, RangeStyle, format_event_range};
//!
//! let opts = FormatOptions::new().with_time_zone("UTC").with_style(RangeStyle::Long);
//! let out = format_event_range(
//!     Some("2025-12-18T10:00:00Z"),
//!     Some("2025-12-18T14:00:00Z"),
//!     &opts,
//! );
//! assert_eq!(out, "December 18, 2025 at 10am-2pm");
//! ```

#[cfg(test)]
mod golden_tests;

use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::time::{parse_iso, same_utc_day};

/// Separator placed between the two ends of a range.
const RANGE_SEPARATOR: &str = " — ";

/// Display style for event ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStyle {
    /// Abbreviated month, no year, `10:00 AM` times.
    #[default]
    Compact,
    /// Full month and year, `10am` / `2:30pm` times.
    Long,
}

/// Options for [`format_date_time`] and [`format_event_range`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// BCP 47 locale tag. Rendering is English for every value.
    pub locale: Option<String>,
    /// IANA zone name used for wall-clock values; the system zone when unset.
    pub time_zone: Option<String>,
    pub style: RangeStyle,
}

impl FormatOptions {
    /// Creates options with the compact style and the system zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the locale tag.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Builder method to set the display zone.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Builder method to set the style.
    pub fn with_style(mut self, style: RangeStyle) -> Self {
        self.style = style;
        self
    }

    fn zone(&self) -> DisplayZone {
        match self.time_zone.as_deref() {
            None => DisplayZone::System,
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => DisplayZone::Named(tz),
                Err(_) => {
                    debug!(time_zone = %name, "unknown time zone, rendering in UTC");
                    DisplayZone::Named(Tz::UTC)
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DisplayZone {
    System,
    Named(Tz),
}

impl DisplayZone {
    fn wall_clock(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::System => instant.with_timezone(&Local).naive_local(),
            Self::Named(tz) => instant.with_timezone(&tz).naive_local(),
        }
    }
}

/// Formats a single timestamp in the compact style, e.g. `Jan 2, 10:00 AM`.
///
/// Missing or empty input yields an empty string; unparsable input is echoed
/// back unchanged.
pub fn format_date_time(iso: Option<&str>, opts: &FormatOptions) -> String {
    let Some(iso) = iso.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    match parse_iso(iso) {
        Some(instant) => compact_date_time(opts.zone().wall_clock(instant)),
        None => iso.to_string(),
    }
}

/// Formats a start/end pair according to `opts.style`.
///
/// Missing or empty start yields an empty string; an unparsable start is
/// echoed back. An unparsable end renders as `<start> — <end verbatim>`.
pub fn format_event_range(
    start_iso: Option<&str>,
    end_iso: Option<&str>,
    opts: &FormatOptions,
) -> String {
    let Some(start_raw) = start_iso.filter(|s| !s.is_empty()) else {
        return String::new();
    };
    let Some(start) = parse_iso(start_raw) else {
        return start_raw.to_string();
    };

    let zone = opts.zone();
    let start_local = zone.wall_clock(start);

    let Some(end_raw) = end_iso.filter(|s| !s.is_empty()) else {
        return match opts.style {
            RangeStyle::Compact => compact_date_time(start_local),
            RangeStyle::Long => format!("{} at {}", long_date(start_local), long_time(start_local)),
        };
    };
    let Some(end) = parse_iso(end_raw) else {
        return format!(
            "{}{}{}",
            format_date_time(Some(start_raw), opts),
            RANGE_SEPARATOR,
            end_raw
        );
    };
    let end_local = zone.wall_clock(end);
    let same_day = same_utc_day(start, end);

    match (opts.style, same_day) {
        (RangeStyle::Compact, true) => format!(
            "{}, {}{}{}",
            compact_date(start_local),
            compact_time(start_local),
            RANGE_SEPARATOR,
            compact_time(end_local)
        ),
        (RangeStyle::Compact, false) => format!(
            "{}{}{}",
            compact_date_time(start_local),
            RANGE_SEPARATOR,
            compact_date_time(end_local)
        ),
        (RangeStyle::Long, true) => format!(
            "{} at {}-{}",
            long_date(start_local),
            long_time(start_local),
            long_time(end_local)
        ),
        (RangeStyle::Long, false) => format!(
            "{} at {}{}{} at {}",
            long_date(start_local),
            long_time(start_local),
            RANGE_SEPARATOR,
            long_date(end_local),
            long_time(end_local)
        ),
    }
}

fn compact_date(dt: NaiveDateTime) -> String {
    dt.format("%b %-d").to_string()
}

fn compact_time(dt: NaiveDateTime) -> String {
    dt.format("%-I:%M %p").to_string()
}

fn compact_date_time(dt: NaiveDateTime) -> String {
    format!("{}, {}", compact_date(dt), compact_time(dt))
}

fn long_date(dt: NaiveDateTime) -> String {
    dt.format("%B %-d, %Y").to_string()
}

/// `10am` on the hour, `10:30am` otherwise.
fn long_time(dt: NaiveDateTime) -> String {
    if dt.minute() == 0 {
        dt.format("%-I%P").to_string()
    } else {
        dt.format("%-I:%M%P").to_string()
    }
}
