//! Parser Tests - Historical Years
//!
//! BCE/CE year expressions through full documents. Written years map onto
//! astronomical numbering: `1 BCE` is year 0, so `1000 BCE` is -999.

use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;
use tidemark::{parse_with, ParseCache, ParseOptions, Timeline};

fn parse(text: &str) -> Timeline {
    let options = ParseOptions {
        now: Some("2022-06-15T12:00:00Z".parse().unwrap()),
        default_zone: None,
    };
    parse_with(text, &options, &mut ParseCache::new())
}

fn year_start(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
}

fn event_dates(timeline: &Timeline, index: usize) -> (DateTime<Utc>, DateTime<Utc>) {
    let event = timeline.root.children[index].as_event().unwrap();
    (event.dates.from, event.dates.to)
}

// ============================================================================
// Single years
// ============================================================================

#[rstest]
#[case("1000 BCE: founding", -999)]
#[case("586 BCE: exile", -585)]
#[case("586 bc: exile", -585)]
#[case("1 BCE: edge of era", 0)]
fn test_bce_year(#[case] line: &str, #[case] astronomical: i32) {
    let timeline = parse(line);
    assert_eq!(
        event_dates(&timeline, 0),
        (year_start(astronomical), year_start(astronomical + 1))
    );
}

#[test]
fn test_ce_marker_reads_as_plain_year() {
    let timeline = parse("14 CE: succession\n");
    assert_eq!(event_dates(&timeline, 0), (year_start(14), year_start(15)));
}

// ============================================================================
// Ranges across the era boundary
// ============================================================================

#[test]
fn test_bce_to_ce_range() {
    let timeline = parse("44 BCE - 14 CE: principate\n");
    assert_eq!(event_dates(&timeline, 0), (year_start(-43), year_start(15)));
}

#[test]
fn test_bce_only_range() {
    let timeline = parse("10000 BCE - 8000 BCE: neolithic\n");
    assert_eq!(
        event_dates(&timeline, 0),
        (year_start(-9999), year_start(-7998))
    );
}

#[test]
fn test_era_less_to_side_reads_as_ce() {
    let timeline = parse("500 BCE - 200: classical\n");
    assert_eq!(event_dates(&timeline, 0), (year_start(-499), year_start(201)));
}

#[test]
fn test_historical_aggregate_spans_millennia() {
    let timeline = parse("1000 BCE: a\n1066: b\n");
    let aggregate = timeline.root.aggregate.as_ref().unwrap();
    assert_eq!(aggregate.min_from, year_start(-999));
    assert_eq!(aggregate.max_to, year_start(1067));
    assert!(timeline.diagnostics.is_empty());
}
