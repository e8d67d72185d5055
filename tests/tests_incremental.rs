//! Parser Tests - Incremental Reparse
//!
//! Single-line edits map the previous timeline forward; anything touching
//! dates, structure, properties or the header falls back to a full parse.
//! Either way the result must be byte-identical to parsing the new text
//! from scratch.

use tidemark::base::{TextRange, TextSize};
use tidemark::{
    map_changes, parse_incremental, parse_with, ChangeSet, MapOutcome, ParseCache, ParseOptions,
    TextEdit, Timeline,
};

fn options() -> ParseOptions {
    ParseOptions {
        now: Some("2022-06-15T12:00:00Z".parse().unwrap()),
        default_zone: None,
    }
}

fn parse(text: &str) -> Timeline {
    parse_with(text, &options(), &mut ParseCache::new())
}

fn span(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::new(start), TextSize::new(end))
}

/// The incremental result must equal a from-scratch parse of the new text,
/// whether the change set mapped or fell back.
fn assert_equivalent(old_text: &str, changes: &ChangeSet) {
    let mut cache = ParseCache::new();
    let previous = parse_with(old_text, &options(), &mut cache);
    let new_text = changes.apply(old_text);
    let incremental =
        parse_incremental(old_text, &new_text, changes, &previous, &options(), &mut cache);
    let fresh = parse(&new_text);
    assert_eq!(incremental, fresh);
}

fn outcome(old_text: &str, changes: &ChangeSet) -> MapOutcome {
    let previous = parse(old_text);
    let new_text = changes.apply(old_text);
    map_changes(&previous, old_text, &new_text, changes)
}

const PLANNER: &str = "\
---
title: Planner
timezone: UTC
---

// weekly planning
group Prep #work
June 1 2022: draft !plan 20%
- [ ] outline
notes line

June 3 2022 - June 5 2022: review
endGroup
June 7 2022 every 2 days x5: standup
";

// ============================================================================
// Mapping path
// ============================================================================

#[test]
fn test_empty_change_set_maps_to_previous() {
    let previous = parse(PLANNER);
    match map_changes(&previous, PLANNER, PLANNER, &ChangeSet::new(Vec::new())) {
        MapOutcome::Mapped(timeline) => assert_eq!(timeline, previous),
        MapOutcome::RequiresFullReparse => panic!("empty set must map"),
    }
}

#[test]
fn test_title_edit_maps() {
    // "draft" in the first event title
    let changes = ChangeSet::single(span(87, 92), "sketch");
    match outcome(PLANNER, &changes) {
        MapOutcome::Mapped(timeline) => {
            let group = timeline.root.children[0].as_group().unwrap();
            let event = group.children[0].as_event().unwrap();
            assert_eq!(event.title, "sketch");
            assert_eq!(event.id.as_deref(), Some("plan"));
        }
        MapOutcome::RequiresFullReparse => panic!("title edit must map"),
    }
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_percent_edit_maps() {
    // "20" in the trailing "20%"
    let changes = ChangeSet::single(span(99, 101), "35");
    match outcome(PLANNER, &changes) {
        MapOutcome::Mapped(timeline) => {
            let group = timeline.root.children[0].as_group().unwrap();
            let event = group.children[0].as_event().unwrap();
            assert_eq!(event.percent, Some(35));
        }
        MapOutcome::RequiresFullReparse => panic!("percent edit must map"),
    }
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_checkbox_toggle_maps() {
    // the space inside "- [ ] outline"
    let changes = ChangeSet::single(span(106, 107), "x");
    assert!(matches!(outcome(PLANNER, &changes), MapOutcome::Mapped(_)));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_body_text_edit_maps() {
    // "notes" at the start of the free-text body line
    let changes = ChangeSet::single(span(117, 122), "status");
    assert!(matches!(outcome(PLANNER, &changes), MapOutcome::Mapped(_)));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_comment_edit_maps() {
    // "weekly" inside the comment
    let changes = ChangeSet::single(span(41, 47), "monthly");
    assert!(matches!(outcome(PLANNER, &changes), MapOutcome::Mapped(_)));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_multiple_safe_edits_map_together() {
    let changes = ChangeSet::new(vec![
        TextEdit::new(span(41, 47), "monthly"),
        TextEdit::new(span(87, 92), "sketch"),
    ]);
    assert!(matches!(outcome(PLANNER, &changes), MapOutcome::Mapped(_)));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_mapped_ranges_stay_sorted() {
    let changes = ChangeSet::single(span(87, 92), "a much longer title phrase");
    let MapOutcome::Mapped(timeline) = outcome(PLANNER, &changes) else {
        panic!("title edit must map");
    };
    for pair in timeline.ranges.windows(2) {
        assert!(
            (pair[0].range.start(), pair[0].range.end())
                <= (pair[1].range.start(), pair[1].range.end())
        );
    }
}

// ============================================================================
// Fallback gates
// ============================================================================

#[test]
fn test_date_edit_requires_full_reparse() {
    // the "1" of "June 1 2022"
    let changes = ChangeSet::single(span(79, 80), "2");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_insertion_at_date_boundary_requires_full_reparse() {
    // directly at the colon after the date expression
    let changes = ChangeSet::single(span(85, 85), " 2021");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_recurrence_edit_requires_full_reparse() {
    // the count in "x5"
    let changes = ChangeSet::single(span(198, 199), "9");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_id_rename_requires_full_reparse() {
    // "plan" inside "!plan"
    let changes = ChangeSet::single(span(94, 98), "plot");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_header_edit_requires_full_reparse() {
    // append to the document title
    let changes = ChangeSet::single(span(18, 18), " 2022");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_group_marker_edit_requires_full_reparse() {
    // the tag on the group line
    let changes = ChangeSet::single(span(68, 73), "#fun");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_indenting_an_end_marker_requires_full_reparse() {
    // "endGroup" still classifies the same, but its content span moves
    let changes = ChangeSet::single(span(163, 163), "  ");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_newline_insertion_requires_full_reparse() {
    let changes = ChangeSet::single(span(116, 116), "\nextra body");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

#[test]
fn test_property_value_edit_requires_full_reparse() {
    let text = "June 1 2022: kickoff\nlocation: office\n";
    // "office"
    let changes = ChangeSet::single(span(31, 37), "remote");
    assert!(matches!(
        outcome(text, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(text, &changes);
}

#[test]
fn test_comment_to_content_requires_full_reparse() {
    // strike the comment marker
    let changes = ChangeSet::single(span(38, 41), "");
    assert!(matches!(
        outcome(PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
    assert_equivalent(PLANNER, &changes);
}

// ============================================================================
// Change set plumbing
// ============================================================================

#[test]
fn test_apply_composes_sorted_edits() {
    let changes = ChangeSet::new(vec![
        TextEdit::new(span(8, 9), "J"),
        TextEdit::new(span(0, 2), "ab"),
    ]);
    assert_eq!(changes.apply("xxcdefghij"), "abcdefghJij");
}

#[test]
fn test_out_of_bounds_changes_fall_back() {
    let previous = parse(PLANNER);
    let changes = ChangeSet::single(span(100_000, 100_001), "x");
    assert!(matches!(
        map_changes(&previous, PLANNER, PLANNER, &changes),
        MapOutcome::RequiresFullReparse
    ));
}
