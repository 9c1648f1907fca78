//! Golden tests for range formatting.
//!
//! These use insta inline snapshots so the exact strings the listing shows
//! are visible next to the inputs. Run `cargo insta review` after an
//! intentional change.

use insta::assert_snapshot;

use crate::format::{FormatOptions, RangeStyle, format_date_time, format_event_range};

fn en_us_utc() -> FormatOptions {
    FormatOptions::new().with_locale("en-US").with_time_zone("UTC")
}

fn en_us_utc_long() -> FormatOptions {
    en_us_utc().with_style(RangeStyle::Long)
}

#[test]
fn golden_single_start() {
    assert_snapshot!(
        format_date_time(Some("2025-01-02T10:00:00Z"), &en_us_utc()),
        @"Jan 2, 10:00 AM"
    );
}

#[test]
fn golden_compact_same_day() {
    assert_snapshot!(
        format_event_range(
            Some("2025-01-02T10:00:00Z"),
            Some("2025-01-02T12:30:00Z"),
            &en_us_utc()
        ),
        @"Jan 2, 10:00 AM — 12:30 PM"
    );
}

#[test]
fn golden_compact_multi_day() {
    assert_snapshot!(
        format_event_range(
            Some("2025-01-02T22:30:00Z"),
            Some("2025-01-03T01:15:00Z"),
            &en_us_utc()
        ),
        @"Jan 2, 10:30 PM — Jan 3, 1:15 AM"
    );
}

#[test]
fn golden_compact_no_end() {
    assert_snapshot!(
        format_event_range(Some("2025-07-04T18:45:00Z"), None, &en_us_utc()),
        @"Jul 4, 6:45 PM"
    );
}

#[test]
fn golden_long_same_day_on_the_hour() {
    assert_snapshot!(
        format_event_range(
            Some("2025-12-18T10:00:00Z"),
            Some("2025-12-18T14:00:00Z"),
            &en_us_utc_long()
        ),
        @"December 18, 2025 at 10am-2pm"
    );
}

#[test]
fn golden_long_no_end() {
    assert_snapshot!(
        format_event_range(Some("2025-12-18T10:00:00Z"), None, &en_us_utc_long()),
        @"December 18, 2025 at 10am"
    );
}

#[test]
fn golden_long_multi_day() {
    assert_snapshot!(
        format_event_range(
            Some("2025-12-18T10:00:00Z"),
            Some("2025-12-19T14:30:00Z"),
            &en_us_utc_long()
        ),
        @"December 18, 2025 at 10am — December 19, 2025 at 2:30pm"
    );
}

#[test]
fn range_formatting_is_deterministic() {
    let opts = en_us_utc_long();
    let first = format_event_range(
        Some("2025-03-09T06:30:00Z"),
        Some("2025-03-09T08:00:00Z"),
        &opts,
    );
    let second = format_event_range(
        Some("2025-03-09T06:30:00Z"),
        Some("2025-03-09T08:00:00Z"),
        &opts,
    );
    assert_eq!(first, second);
    assert_eq!(first, "March 9, 2025 at 6:30am-8am");
}
