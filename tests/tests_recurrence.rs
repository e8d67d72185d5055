//! Parser Tests - Recurrence
//!
//! `every ...` clauses between the date and the colon: parsing, the
//! recognized range, and expansion caps.

use chrono::{DateTime, Utc};
use tidemark::base::{TextRange, TextSize};
use tidemark::dates::Zone;
use tidemark::model::Event;
use tidemark::{parse_with, ParseCache, ParseOptions, RangeType, Timeline};

fn parse(text: &str) -> Timeline {
    let options = ParseOptions {
        now: Some("2022-06-15T12:00:00Z".parse().unwrap()),
        default_zone: None,
    };
    parse_with(text, &options, &mut ParseCache::new())
}

fn instant(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn span(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

fn first_event(timeline: &Timeline) -> &Event {
    timeline.root.children[0].as_event().unwrap()
}

// ============================================================================
// Clause recognition
// ============================================================================

#[test]
fn test_recurrence_sits_between_date_and_colon() {
    let timeline = parse("June 1 2022 every 2 days x30: standup\n");
    let event = first_event(&timeline);
    assert_eq!(event.title, "standup");
    assert_eq!(event.dates.from, instant("2022-06-01T00:00:00Z"));
    let rule = event.recurrence.as_ref().unwrap();
    assert_eq!(rule.count, Some(30));
    assert_eq!(event.ranges.date_part, span(0, 11));
    assert_eq!(event.ranges.recurrence, Some(span(12, 28)));
    assert!(timeline
        .ranges
        .iter()
        .any(|r| r.kind == RangeType::Recurrence && r.range == span(12, 28)));
}

#[test]
fn test_bare_unit_recurrence() {
    let timeline = parse("June 1 2022 every month: rent\n");
    let event = first_event(&timeline);
    let rule = event.recurrence.as_ref().unwrap();
    assert_eq!(rule.count, None);
    let instances = event.expand_recurrence(Zone::Utc, 3);
    assert_eq!(instances[1].from, instant("2022-07-01T00:00:00Z"));
    assert_eq!(instances[2].from, instant("2022-08-01T00:00:00Z"));
}

#[test]
fn test_plain_event_has_no_recurrence() {
    let timeline = parse("June 1 2022: standup\n");
    let event = first_event(&timeline);
    assert!(event.recurrence.is_none());
    assert!(event.ranges.recurrence.is_none());
    assert_eq!(event.expand_recurrence(Zone::Utc, 10).len(), 1);
}

// ============================================================================
// Expansion
// ============================================================================

#[test]
fn test_expansion_respects_caller_limit_and_count() {
    let timeline = parse("June 1 2022 every 12 months x30: review\n");
    let event = first_event(&timeline);
    assert_eq!(event.expand_recurrence(Zone::Utc, 10).len(), 10);
    let instances = event.expand_recurrence(Zone::Utc, 50);
    assert_eq!(instances.len(), 30);
    assert_eq!(instances[1].from, instant("2023-06-01T00:00:00Z"));
}

#[test]
fn test_expansion_preserves_instance_duration() {
    let timeline = parse("June 1 2022 every 2 days x30: standup\n");
    let event = first_event(&timeline);
    let instances = event.expand_recurrence(Zone::Utc, 3);
    assert_eq!(instances[0].from, instant("2022-06-01T00:00:00Z"));
    assert_eq!(instances[1].from, instant("2022-06-03T00:00:00Z"));
    assert_eq!(instances[2].from, instant("2022-06-05T00:00:00Z"));
    for window in &instances {
        assert_eq!(window.duration(), chrono::Duration::days(1));
    }
}

#[test]
fn test_expansion_stops_at_until_date() {
    let timeline = parse("June 1 2022 every 1 week until July 2022: sync\n");
    let event = first_event(&timeline);
    let instances = event.expand_recurrence(Zone::Utc, 100);
    // Jun 1, 8, 15, 22, 29; Jul 6 is past the cut
    assert_eq!(instances.len(), 5);
    assert_eq!(instances[4].from, instant("2022-06-29T00:00:00Z"));
}
