//! Plain-text rendering of the event listing.

use eventfeed_core::{Event, FormatOptions, format_event_range};

/// One line per event: `<range>  <title>`, plus ` @ <location>` when known.
///
/// Events without a start render the title alone.
pub fn render_line(event: &Event, opts: &FormatOptions) -> String {
    let range = format_event_range(event.starts_at.as_deref(), event.ends_at.as_deref(), opts);
    let mut line = if range.is_empty() {
        event.title.clone()
    } else {
        format!("{}  {}", range, event.title)
    };
    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(" @ ");
        line.push_str(location);
    }
    line
}

/// Renders the whole listing, or `empty_text` when there is nothing to show.
pub fn render_text(events: &[Event], opts: &FormatOptions, empty_text: &str) -> String {
    if events.is_empty() {
        return empty_text.to_string();
    }
    events
        .iter()
        .map(|event| render_line(event, opts))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventfeed_core::RangeStyle;

    fn utc() -> FormatOptions {
        FormatOptions::new().with_time_zone("UTC")
    }

    #[test]
    fn line_with_range_and_location() {
        let mut event = Event::new("e1", "Community Picnic")
            .with_starts_at("2025-06-07T16:00:00Z")
            .with_ends_at("2025-06-07T19:30:00Z");
        event.location = Some("Riverside Park".into());

        assert_eq!(
            render_line(&event, &utc()),
            "Jun 7, 4:00 PM — 7:30 PM  Community Picnic @ Riverside Park"
        );
        assert_eq!(
            render_line(&event, &utc().with_style(RangeStyle::Long)),
            "June 7, 2025 at 4pm-7:30pm  Community Picnic @ Riverside Park"
        );
    }

    #[test]
    fn line_without_start() {
        let event = Event::new("e2", "Prayer Night");
        assert_eq!(render_line(&event, &utc()), "Prayer Night");
    }

    #[test]
    fn empty_location_is_omitted() {
        let mut event = Event::new("e3", "Brunch").with_starts_at("2025-06-08T15:00:00Z");
        event.location = Some(String::new());
        assert_eq!(render_line(&event, &utc()), "Jun 8, 3:00 PM  Brunch");
    }

    #[test]
    fn text_listing() {
        let events = vec![
            Event::new("a", "First").with_starts_at("2025-06-08T15:00:00Z"),
            Event::new("b", "Second").with_starts_at("2025-06-09T15:00:00Z"),
        ];
        assert_eq!(
            render_text(&events, &utc(), "none"),
            "Jun 8, 3:00 PM  First\nJun 9, 3:00 PM  Second"
        );
        assert_eq!(render_text(&[], &utc(), "No upcoming events"), "No upcoming events");
    }
}
