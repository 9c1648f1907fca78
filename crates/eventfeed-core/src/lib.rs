//! Core types: events, instances, time parsing, range formatting, tracing

pub mod event;
pub mod format;
pub mod time;
pub mod tracing;

pub use event::{Event, EventTime, Instance};
pub use format::{FormatOptions, RangeStyle, format_date_time, format_event_range};
pub use time::{parse_iso, same_utc_day, utc_date_stamp};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
