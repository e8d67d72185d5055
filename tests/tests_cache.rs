//! Parser Tests - Parse Cache
//!
//! The memo tables must be invisible: parsing with a warm cache, a cache
//! shared across documents, or no cache at all gives identical timelines.

use chrono::{DateTime, Utc};
use tidemark::{parse_with, ParseCache, ParseOptions, Timeline};

fn options() -> ParseOptions {
    ParseOptions {
        now: Some("2022-06-15T12:00:00Z".parse().unwrap()),
        default_zone: None,
    }
}

fn instant(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn event_from(timeline: &Timeline, index: usize) -> DateTime<Utc> {
    timeline.root.children[index].as_event().unwrap().dates.from
}

const TRIP: &str = "\
---
timezone: UTC
---

group Abroad
timezone: America/New_York
2022-03-05: meeting

endGroup
2022-03-05: debrief
";

// ============================================================================
// Transparency
// ============================================================================

#[test]
fn test_warm_cache_reparse_is_identical() {
    let mut cache = ParseCache::new();
    let cold = parse_with(TRIP, &options(), &mut cache);
    let warm = parse_with(TRIP, &options(), &mut cache);
    assert_eq!(cold, warm);
}

#[test]
fn test_cache_shared_across_documents_is_invisible() {
    let mut shared = ParseCache::new();
    parse_with(TRIP, &options(), &mut shared);
    let other = "2022-03-05: solo\n2023: later\n";
    let with_shared = parse_with(other, &options(), &mut shared);
    let fresh = parse_with(other, &options(), &mut ParseCache::new());
    assert_eq!(with_shared, fresh);
}

// ============================================================================
// Zone partitioning
// ============================================================================

#[test]
fn test_same_literal_resolves_per_zone() {
    let mut cache = ParseCache::new();
    let timeline = parse_with(TRIP, &options(), &mut cache);
    let group = timeline.root.children[0].as_group().unwrap();
    let meeting = group.children[0].as_event().unwrap();
    // March is still EST, five hours behind
    assert_eq!(meeting.dates.from, instant("2022-03-05T05:00:00Z"));
    assert_eq!(event_from(&timeline, 1), instant("2022-03-05T00:00:00Z"));
}

#[test]
fn test_day_first_does_not_leak_through_the_cache() {
    let mut shared = ParseCache::new();
    let month_first = parse_with("5/9/2009: ambiguous\n", &options(), &mut shared);
    assert_eq!(event_from(&month_first, 0), instant("2009-05-09T00:00:00Z"));
    let day_first = parse_with(
        "dateFormat: d/M/y\n\n5/9/2009: ambiguous\n",
        &options(),
        &mut shared,
    );
    assert_eq!(event_from(&day_first, 0), instant("2009-09-05T00:00:00Z"));
}

// ============================================================================
// Clock- and document-dependent expressions are recomputed
// ============================================================================

#[test]
fn test_now_is_never_served_from_the_cache() {
    let mut shared = ParseCache::new();
    let first = parse_with("now: checkpoint\n", &options(), &mut shared);
    assert_eq!(event_from(&first, 0), instant("2022-06-15T12:00:00Z"));

    let later = ParseOptions {
        now: Some("2023-01-01T00:00:00Z".parse().unwrap()),
        default_zone: None,
    };
    let second = parse_with("now: checkpoint\n", &later, &mut shared);
    assert_eq!(event_from(&second, 0), instant("2023-01-01T00:00:00Z"));
}

#[test]
fn test_references_resolve_against_the_current_document() {
    let mut shared = ParseCache::new();
    let a = parse_with("2022: base !a\n1 week after !a: next\n", &options(), &mut shared);
    assert_eq!(event_from(&a, 1), instant("2023-01-01T00:00:00Z"));
    let b = parse_with("2030: base !a\n1 week after !a: next\n", &options(), &mut shared);
    assert_eq!(event_from(&b, 1), instant("2031-01-01T00:00:00Z"));
}

#[test]
fn test_clear_keeps_results_stable() {
    let mut cache = ParseCache::new();
    let before = parse_with(TRIP, &options(), &mut cache);
    cache.clear();
    let after = parse_with(TRIP, &options(), &mut cache);
    assert_eq!(before, after);
}
