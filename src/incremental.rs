//! Incremental re-parsing by offset remapping.
//!
//! Given the previous parse result and a change set against the previous
//! text, [`map_changes`] tries to produce the same result a full reparse
//! would, without redoing grammar recognition: every stored range is pushed
//! through the change set's position mapping and the edited lines' text-borne
//! fields are re-derived in place.
//!
//! The strategy is conservative. Any edit that could change line structure
//! or cross-line state (a newline, a header or property line, a structural
//! marker, a protected date-part or recurrence span, an event id) abandons
//! the mapping and reports [`MapOutcome::RequiresFullReparse`]. Falling back
//! when mapping would have been safe is acceptable; returning a result that
//! diverges from a full reparse is not.

use text_size::{TextRange, TextSize};

use crate::base::{Range, RangeType};
use crate::cache::ParseCache;
use crate::dates;
use crate::model::{Event, EventGroup, Node, Path, SupplementalBlock, Timeline};
use crate::parser::{self, body, classify, properties, split_lines, Line, ParseOptions};

/// A single replacement against the previous document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Replaced span in the previous text
    pub range: TextRange,
    /// Replacement text
    pub insert: String,
}

impl TextEdit {
    pub fn new(range: TextRange, insert: impl Into<String>) -> Self {
        Self {
            range,
            insert: insert.into(),
        }
    }

    fn delta(&self) -> i64 {
        self.insert.len() as i64 - i64::from(u32::from(self.range.len()))
    }
}

/// A sorted list of non-overlapping edits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    edits: Vec<TextEdit>,
}

impl ChangeSet {
    pub fn new(mut edits: Vec<TextEdit>) -> Self {
        edits.sort_by_key(|e| (e.range.start(), e.range.end()));
        Self { edits }
    }

    pub fn single(range: TextRange, insert: impl Into<String>) -> Self {
        Self::new(vec![TextEdit::new(range, insert)])
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    /// Apply the edits to `text`, producing the new document.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for edit in &self.edits {
            out.push_str(&text[cursor..edit.range.start().into()]);
            out.push_str(&edit.insert);
            cursor = edit.range.end().into();
        }
        out.push_str(&text[cursor..]);
        out
    }

    fn is_valid(&self, len: TextSize) -> bool {
        let mut prev_end = TextSize::new(0);
        for edit in &self.edits {
            if edit.range.start() < prev_end || edit.range.end() > len {
                return false;
            }
            prev_end = edit.range.end();
        }
        true
    }

    /// Map a range start. Text inserted exactly at the offset lands before
    /// the range, so a pure insertion there does not move it.
    fn map_start(&self, offset: TextSize) -> TextSize {
        let mut delta = 0i64;
        for edit in &self.edits {
            let end = edit.range.end();
            if end < offset || (end == offset && !edit.range.is_empty()) {
                delta += edit.delta();
            }
        }
        shift(offset, delta)
    }

    /// Map a range end. Text inserted exactly at the offset lands inside
    /// the range, so a pure insertion there extends it.
    fn map_end(&self, offset: TextSize) -> TextSize {
        let mut delta = 0i64;
        for edit in &self.edits {
            if edit.range.end() <= offset {
                delta += edit.delta();
            }
        }
        shift(offset, delta)
    }

    fn map_range(&self, range: TextRange) -> TextRange {
        TextRange::new(self.map_start(range.start()), self.map_end(range.end()))
    }
}

fn shift(offset: TextSize, delta: i64) -> TextSize {
    let shifted = i64::from(u32::from(offset)) + delta;
    TextSize::new(shifted.max(0) as u32)
}

/// Result of an incremental mapping attempt
#[derive(Debug)]
pub enum MapOutcome {
    /// The previous result, remapped to the new text
    Mapped(Timeline),
    /// The change cannot be mapped safely; run a full parse
    RequiresFullReparse,
}

/// Re-parse `new_text` incrementally, falling back to a full parse when the
/// change set cannot be mapped.
pub fn parse_incremental(
    old_text: &str,
    new_text: &str,
    changes: &ChangeSet,
    previous: &Timeline,
    options: &ParseOptions,
    cache: &mut ParseCache,
) -> Timeline {
    match map_changes(previous, old_text, new_text, changes) {
        MapOutcome::Mapped(timeline) => timeline,
        MapOutcome::RequiresFullReparse => parser::parse_with(new_text, options, cache),
    }
}

/// What an edited line contributes to the mapped result
enum LinePlan {
    /// Re-emit the line's comment range
    Comment,
    /// Re-derive the first line of the event at `Path`
    EventFirst(Path),
    /// Re-derive supplemental block `usize` of the event at `Path`
    Body(Path, usize),
}

/// Attempt to remap `previous` onto `new_text`.
pub fn map_changes(
    previous: &Timeline,
    old_text: &str,
    new_text: &str,
    changes: &ChangeSet,
) -> MapOutcome {
    if changes.is_empty() {
        return MapOutcome::Mapped(previous.clone());
    }
    if !changes.is_valid(TextSize::new(old_text.len() as u32)) {
        return bail("change set is unsorted, overlapping, or out of bounds");
    }
    for edit in changes.edits() {
        let removed = &old_text[edit.range.start().into()..edit.range.end().into()];
        if edit.insert.contains(['\n', '\r']) || removed.contains(['\n', '\r']) {
            return bail("edit crosses a line boundary");
        }
    }
    let old_lines = split_lines(old_text);
    let new_lines = split_lines(new_text);
    if old_lines.len() != new_lines.len() {
        return bail("line structure changed");
    }
    if let Some(header) = previous.header.range {
        if changes.edits().iter().any(|e| touches(e.range, header)) {
            return bail("edit touches the header block");
        }
    }
    for (_, event) in previous.iter_events() {
        let mut protected = vec![event.ranges.date_part];
        protected.extend(event.ranges.recurrence);
        for span in protected {
            if changes.edits().iter().any(|e| touches(e.range, span)) {
                return bail("edit touches a protected date range");
            }
        }
    }
    let mut windows = Vec::new();
    collect_window_spans(&previous.root, &mut windows);
    for span in windows {
        if changes.edits().iter().any(|e| touches(e.range, span)) {
            return bail("edit touches a property window");
        }
    }

    let day_first = previous.header.date_format.day_first();
    let mut plans: Vec<(usize, LinePlan)> = Vec::new();
    for i in affected_lines(changes, &old_lines) {
        let old = &old_lines[i];
        let new = &new_lines[i];
        if old.is_blank() != new.is_blank() {
            return bail("edit changes a blank line");
        }
        if old.is_blank() {
            continue;
        }
        if classify::is_comment(old.text) != classify::is_comment(new.text) {
            return bail("edit changes a comment line");
        }
        if classify::is_comment(old.text) {
            plans.push((i, LinePlan::Comment));
            continue;
        }
        if old.text.trim() == "---" || new.text.trim() == "---" {
            return bail("edit involves a header fence");
        }
        if classify::classify(old.text).is_some() || classify::classify(new.text).is_some() {
            // only identity edits are safe: the stored marker ranges track
            // the trimmed content, which boundary insertions would shift
            if old.text == new.text {
                continue;
            }
            return bail("edit rewrites a structural line");
        }
        if properties::property_key(old.text).is_some()
            || properties::property_key(new.text).is_some()
        {
            return bail("edit involves a property line");
        }
        let old_found = dates::recognize(old.text, day_first, None);
        let new_found = dates::recognize(new.text, day_first, None);
        match (old_found, new_found) {
            (None, None) => match find_body_owner(previous, old.range) {
                BodyOwner::Event(path, index) => plans.push((i, LinePlan::Body(path, index))),
                BodyOwner::Unowned => {}
                BodyOwner::Missing => return bail("edited body line has no owner"),
            },
            (Some(a), Some(b)) => {
                let old_date = slice(old.text, a.date_range);
                let new_date = slice(new.text, b.date_range);
                if old_date != new_date {
                    return bail("edit changes a date expression");
                }
                let old_rule = a.recurrence.as_ref().map(|(_, span)| slice(old.text, *span));
                let new_rule = b.recurrence.as_ref().map(|(_, span)| slice(new.text, *span));
                if old_rule != new_rule {
                    return bail("edit changes a recurrence clause");
                }
                let old_id = body::first_line(
                    &old.text[usize::from(a.colon) + 1..],
                    TextSize::new(0),
                )
                .id;
                let new_id = body::first_line(
                    &new.text[usize::from(b.colon) + 1..],
                    TextSize::new(0),
                )
                .id;
                if old_id != new_id {
                    return bail("edit changes an event id");
                }
                match find_first_line_owner(previous, old.range) {
                    Some(path) => plans.push((i, LinePlan::EventFirst(path))),
                    None => return bail("edited event line has no owner"),
                }
            }
            _ => return bail("edit changes event recognition"),
        }
    }

    // Every gate passed; remap the clone and re-derive the edited lines.
    let mut timeline = previous.clone();
    remap_group(&mut timeline.root, changes);
    timeline.header.range = timeline.header.range.map(|r| changes.map_range(r));
    for diagnostic in &mut timeline.diagnostics {
        diagnostic.range = changes.map_range(diagnostic.range);
    }
    for range in &mut timeline.ranges {
        range.range = changes.map_range(range.range);
    }
    let folds = std::mem::take(&mut timeline.folds);
    for (_, mut fold) in folds {
        fold.range = changes.map_range(fold.range);
        fold.fold_from = changes.map_end(fold.fold_from);
        timeline.folds.insert(fold.key(), fold);
    }

    let rederived: Vec<TextRange> = plans.iter().map(|(i, _)| new_lines[*i].range).collect();
    timeline
        .ranges
        .retain(|r| !rederived.iter().any(|span| contains(*span, r.range)));

    let mut emitted: Vec<Range> = Vec::new();
    for (i, plan) in plans {
        let line = &new_lines[i];
        match plan {
            LinePlan::Comment => {
                emitted.push(Range::new(RangeType::Comment, line.content_range()));
            }
            LinePlan::EventFirst(path) => {
                let Some(Node::Event(event)) = timeline.node_at_mut(&path) else {
                    return bail("mapped event went missing");
                };
                if !rederive_first_line(event, line, day_first, &mut emitted) {
                    return bail("mapped event line no longer recognizes");
                }
            }
            LinePlan::Body(path, index) => {
                let Some(Node::Event(event)) = timeline.node_at_mut(&path) else {
                    return bail("mapped event went missing");
                };
                let content = line.content_range();
                let block = body::supplemental(line.text, content);
                match &block {
                    SupplementalBlock::Checkbox { .. } => {
                        emitted.push(Range::new(RangeType::Checkbox, content));
                    }
                    SupplementalBlock::ListItem { .. } => {
                        emitted.push(Range::new(RangeType::ListItem, content));
                    }
                    _ => {}
                }
                body::inline_ranges(line.text, line.range.start(), &mut emitted);
                let Some(slot) = event.supplemental.get_mut(index) else {
                    return bail("mapped body line went missing");
                };
                *slot = block;
            }
        }
    }
    timeline.ranges.append(&mut emitted);
    timeline
        .ranges
        .sort_by_key(|r| (r.range.start(), r.range.end()));
    MapOutcome::Mapped(timeline)
}

/// Rebuild the first-line fields of `event` from its edited line.
fn rederive_first_line(
    event: &mut Event,
    line: &Line<'_>,
    day_first: bool,
    out: &mut Vec<Range>,
) -> bool {
    let Some(found) = dates::recognize(line.text, day_first, None) else {
        return false;
    };
    let base = line.range.start();
    let date_span = found.date_range + base;
    out.push(Range::new(RangeType::DateRange, date_span));
    let colon = base + found.colon;
    out.push(Range::new(
        RangeType::DateRangeColon,
        TextRange::new(colon, colon + TextSize::new(1)),
    ));
    let recurrence_span = found.recurrence.as_ref().map(|(_, span)| *span + base);
    if let Some(span) = recurrence_span {
        out.push(Range::new(RangeType::Recurrence, span));
    }
    let text_start = usize::from(found.colon) + 1;
    let text = &line.text[text_start..];
    let text_base = base + TextSize::new(text_start as u32);
    let mut first = body::first_line(text, text_base);
    body::inline_ranges(text, text_base, &mut first.ranges);
    out.append(&mut first.ranges);
    event.title = first.title;
    event.tags = first.tags;
    event.completed = first.completed;
    event.percent = first.percent;
    event.ranges.date_part = date_span;
    event.ranges.recurrence = recurrence_span;
    true
}

fn remap_group(group: &mut EventGroup, changes: &ChangeSet) {
    if let Some(ranges) = &mut group.ranges {
        ranges.whole = changes.map_range(ranges.whole);
        ranges.marker = changes.map_range(ranges.marker);
        ranges.properties = ranges.properties.map(|r| changes.map_range(r));
    }
    for child in &mut group.children {
        match child {
            Node::Event(event) => {
                event.ranges.whole = changes.map_range(event.ranges.whole);
                event.ranges.date_part = changes.map_range(event.ranges.date_part);
                event.ranges.recurrence =
                    event.ranges.recurrence.map(|r| changes.map_range(r));
                event.ranges.properties =
                    event.ranges.properties.map(|r| changes.map_range(r));
                for block in &mut event.supplemental {
                    let range = block.range_mut();
                    *range = changes.map_range(*range);
                }
            }
            Node::Group(inner) => remap_group(inner, changes),
        }
    }
}

fn collect_window_spans(group: &EventGroup, out: &mut Vec<TextRange>) {
    if let Some(ranges) = &group.ranges {
        out.extend(ranges.properties);
    }
    for child in &group.children {
        match child {
            Node::Event(event) => out.extend(event.ranges.properties),
            Node::Group(inner) => collect_window_spans(inner, out),
        }
    }
}

enum BodyOwner {
    Event(Path, usize),
    /// A plain document-level line with nothing stored for it
    Unowned,
    Missing,
}

fn find_body_owner(previous: &Timeline, line: TextRange) -> BodyOwner {
    for (path, event) in previous.iter_events() {
        if !contains(event.ranges.whole, line) {
            continue;
        }
        let index = event
            .supplemental
            .iter()
            .position(|block| contains(line, block.range()));
        return match index {
            Some(index) => BodyOwner::Event(path, index),
            None => BodyOwner::Missing,
        };
    }
    BodyOwner::Unowned
}

fn find_first_line_owner(previous: &Timeline, line: TextRange) -> Option<Path> {
    previous
        .iter_events()
        .find(|(_, event)| contains(line, event.ranges.date_part))
        .map(|(path, _)| path)
}

fn affected_lines(changes: &ChangeSet, lines: &[Line<'_>]) -> Vec<usize> {
    let mut affected = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if changes.edits().iter().any(|e| touches(e.range, line.range)) {
            affected.push(i);
        }
    }
    affected
}

/// Closed-interval intersection, so an insertion at a boundary still counts
fn touches(edit: TextRange, span: TextRange) -> bool {
    edit.start() <= span.end() && edit.end() >= span.start()
}

fn contains(outer: TextRange, inner: TextRange) -> bool {
    outer.start() <= inner.start() && inner.end() <= outer.end()
}

fn slice(text: &str, range: TextRange) -> &str {
    &text[usize::from(range.start())..usize::from(range.end())]
}

fn bail(reason: &str) -> MapOutcome {
    tracing::debug!("[INCR] full reparse: {reason}");
    MapOutcome::RequiresFullReparse
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(start: u32, end: u32, insert: &str) -> TextEdit {
        TextEdit::new(TextRange::new(start.into(), end.into()), insert)
    }

    #[test]
    fn test_apply() {
        let changes = ChangeSet::new(vec![edit(0, 2, "AB"), edit(5, 5, "+"), edit(7, 9, "")]);
        assert_eq!(changes.apply("abcdefghij"), "ABcde+fgj");
    }

    #[test]
    fn test_validity() {
        let len = TextSize::new(10);
        assert!(ChangeSet::new(vec![edit(0, 2, "x"), edit(2, 4, "y")]).is_valid(len));
        assert!(!ChangeSet::new(vec![edit(0, 3, "x"), edit(2, 4, "y")]).is_valid(len));
        assert!(!ChangeSet::single(TextRange::new(8.into(), 12.into()), "x").is_valid(len));
    }

    #[test]
    fn test_insertion_at_offset_keeps_start_extends_end() {
        let changes = ChangeSet::single(TextRange::empty(4.into()), "xx");
        assert_eq!(changes.map_start(TextSize::new(4)), TextSize::new(4));
        assert_eq!(changes.map_end(TextSize::new(4)), TextSize::new(6));
        assert_eq!(changes.map_start(TextSize::new(5)), TextSize::new(7));
    }

    #[test]
    fn test_replacement_shifts_later_offsets() {
        let changes = ChangeSet::single(TextRange::new(2.into(), 5.into()), "x");
        assert_eq!(changes.map_start(TextSize::new(1)), TextSize::new(1));
        assert_eq!(changes.map_start(TextSize::new(5)), TextSize::new(3));
        assert_eq!(changes.map_end(TextSize::new(8)), TextSize::new(6));
    }

    #[test]
    fn test_deletion_inside_range_never_inverts() {
        let changes = ChangeSet::single(TextRange::new(3.into(), 6.into()), "");
        let mapped = changes.map_range(TextRange::new(3.into(), 6.into()));
        assert_eq!(mapped, TextRange::new(3.into(), 3.into()));
    }
}
