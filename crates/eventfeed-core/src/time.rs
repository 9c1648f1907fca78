//! Timestamp helpers.
//!
//! Upstream records carry ISO-8601 strings that are kept verbatim on the
//! public [`Event`](crate::Event) shape. These helpers parse them on demand
//! for ordering, freshness and day-boundary checks.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses an ISO-8601 timestamp into UTC.
///
/// Accepted forms, in order:
/// - RFC 3339 with an offset or `Z` (`2025-01-02T10:00:00Z`)
/// - a naive datetime, read as UTC (`2025-01-02T10:00:00`, fractional seconds allowed)
/// - a bare date, read as UTC midnight (`2025-01-02`)
///
/// Returns `None` for anything else, including the empty string.
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Returns true when both instants fall on the same UTC calendar day.
///
/// Day collapsing in the range formatter is decided in UTC regardless of the
/// display zone.
pub fn same_utc_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

/// Formats the UTC date of `now` as `YYYY-MM-DD`, the form the instances
/// endpoint expects in its `where[starts_at][gte]` filter.
pub fn utc_date_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}
