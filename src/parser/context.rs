//! The stateful tree builder.
//!
//! One `ParsingContext` lives for exactly one parse pass. Lines arrive in
//! document order; the context pushes events and groups into the tree,
//! tracks the active timezone stack and the prior event, collects ranges,
//! folds and diagnostics, and finally moves everything into the finished
//! [`Timeline`].

use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use crate::base::{FoldKind, FoldRegion, Range, RangeType};
use crate::cache::ParseCache;
use crate::dates::resolve::{self, ResolveEnv, ResolveIssue};
use crate::dates::{self, DateRange, EventDateMatch, Zone};
use crate::model::{
    DiagnosticCode, DisplayScale, DocumentMessage, Event, EventGroup, EventRanges, GroupRanges,
    GroupStyle, Header, Metadata, Node, ParseDiagnostic, Path, Timeline,
};

use super::classify::{self, StructuralLine};
use super::header::HeaderScan;
use super::{body, properties, Line, ParseOptions};

/// An open group awaiting its end marker
struct OpenFrame {
    group: EventGroup,
    /// Child index this group will occupy in its parent
    index_in_parent: usize,
    /// Whether the group pushed a timezone override
    pushed_zone: bool,
    /// The `group`/`section`/heading line
    marker: TextRange,
    properties_span: Option<TextRange>,
    /// End of the marker line, where folding starts
    fold_from: TextSize,
}

/// A run of consecutive comment lines, pending fold emission
struct CommentRun {
    start: TextSize,
    first_line_end: TextSize,
    last_end: TextSize,
    lines: usize,
}

/// An event accumulating body lines before it is attached to the tree
struct PendingEvent {
    event: Event,
    path: Path,
    fold_from: TextSize,
    extent: TextSize,
}

pub(crate) struct ParsingContext {
    now: DateTime<Utc>,
    day_first: bool,
    /// Innermost-last; never empty
    zones: Vec<Zone>,
    root: EventGroup,
    stack: Vec<OpenFrame>,
    pending: Option<PendingEvent>,
    /// Range of the most recently attached event
    prior: Option<DateRange>,
    /// Resolved ranges of events carrying an id, for `!id` references
    id_ranges: FxHashMap<SmolStr, DateRange>,
    ids: FxHashMap<SmolStr, Path>,
    header: Header,
    ranges: Vec<Range>,
    folds: FxHashMap<u32, FoldRegion>,
    diagnostics: Vec<ParseDiagnostic>,
    messages: Vec<DocumentMessage>,
    comments: Option<CommentRun>,
    /// End of the last line that contributed content
    extent: TextSize,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
    max_span: Option<TimeDelta>,
}

impl ParsingContext {
    pub fn new(options: &ParseOptions, scan: HeaderScan) -> Self {
        let HeaderScan {
            header,
            consumed: _,
            ranges,
            fold,
            mut diagnostics,
        } = scan;
        let mut messages = Vec::new();
        let base_zone = match header.timezone.as_deref() {
            Some(raw) => match Zone::parse(raw) {
                Ok(zone) => zone,
                Err(err) => {
                    tracing::debug!("[PARSE] {err}, falling back to the default zone");
                    let range = header
                        .range
                        .unwrap_or_else(|| TextRange::empty(TextSize::new(0)));
                    diagnostics.push(ParseDiagnostic::new(
                        err.to_string(),
                        range,
                        DiagnosticCode::E0301,
                    ));
                    options.default_zone.unwrap_or_default()
                }
            },
            None => match options.default_zone {
                Some(zone) => zone,
                None => {
                    messages.push(DocumentMessage::new("no timezone specified, using UTC"));
                    Zone::Utc
                }
            },
        };
        let mut folds = FxHashMap::default();
        if let Some(fold) = fold {
            folds.insert(fold.key(), fold);
        }
        let extent = header.range.map(TextRange::end).unwrap_or_default();
        Self {
            now: options.now.unwrap_or_else(Utc::now),
            day_first: header.date_format.day_first(),
            zones: vec![base_zone],
            root: EventGroup::default(),
            stack: Vec::new(),
            pending: None,
            prior: None,
            id_ranges: FxHashMap::default(),
            ids: FxHashMap::default(),
            header,
            ranges,
            folds,
            diagnostics,
            messages,
            comments: None,
            extent,
            earliest: None,
            latest: None,
            max_span: None,
        }
    }

    /// Process the line at `i`; returns how many lines were consumed.
    pub fn step(&mut self, lines: &[Line<'_>], i: usize, cache: &mut ParseCache) -> usize {
        let line = &lines[i];
        if line.is_blank() {
            self.close_comment_run();
            return 1;
        }
        if classify::is_comment(line.text) {
            self.comment_line(line);
            return 1;
        }
        self.close_comment_run();
        if let Some(kind) = classify::classify(line.text) {
            return self.structural(kind, line, lines, i);
        }
        self.content(line, lines, i, cache)
    }

    /// Move everything into the finished result.
    pub fn finish(mut self) -> Timeline {
        self.finish_pending();
        self.close_comment_run();
        while !self.stack.is_empty() {
            self.close_group(self.extent);
        }
        self.root.recompute_aggregate();
        let metadata = Metadata {
            title: self.header.title.clone(),
            description: self.header.description.clone(),
            earliest: self.earliest,
            latest: self.latest,
            max_span: self.max_span,
            scale: self.max_span.map(DisplayScale::from_span).unwrap_or_default(),
        };
        self.ranges
            .sort_by_key(|r| (r.range.start(), r.range.end()));
        Timeline {
            root: self.root,
            ranges: self.ranges,
            folds: self.folds,
            header: self.header,
            ids: self.ids,
            diagnostics: self.diagnostics,
            messages: self.messages,
            metadata,
        }
    }

    // =========================================================================
    // Structural lines
    // =========================================================================

    fn structural(
        &mut self,
        kind: StructuralLine<'_>,
        line: &Line<'_>,
        lines: &[Line<'_>],
        i: usize,
    ) -> usize {
        match kind {
            StructuralLine::TagDefinition {
                name,
                value,
                name_range,
            } => {
                self.finish_pending();
                self.header.tags.insert(SmolStr::new(name), value.to_string());
                self.ranges.push(Range::new(
                    RangeType::TagDefinition,
                    name_range + line.range.start(),
                ));
                self.extent = line.range.end();
                1
            }
            StructuralLine::GroupStart {
                style,
                rest,
                rest_start,
            } => {
                self.finish_pending();
                self.open_group(style, rest, rest_start, None, line, lines, i)
            }
            StructuralLine::GroupEnd => {
                // unmatched end lines are inert
                if self.stack.is_empty() {
                    return 1;
                }
                self.finish_pending();
                self.ranges
                    .push(Range::new(RangeType::SectionEnd, line.content_range()));
                self.extent = line.range.end();
                self.close_group(line.range.end());
                1
            }
            StructuralLine::Heading { level, title } => {
                self.finish_pending();
                self.close_headings(level);
                self.open_group(
                    GroupStyle::Section,
                    title,
                    TextSize::new(0),
                    Some(level),
                    line,
                    lines,
                    i,
                )
            }
        }
    }

    fn open_group(
        &mut self,
        style: GroupStyle,
        rest: &str,
        rest_start: TextSize,
        heading_level: Option<u8>,
        line: &Line<'_>,
        lines: &[Line<'_>],
        i: usize,
    ) -> usize {
        let (title, tags) =
            self.split_group_tags(rest, line.range.start() + rest_start, heading_level.is_some());
        let window = properties::scan(&lines[i + 1..]);
        self.ranges
            .push(Range::new(RangeType::Section, line.content_range()));
        self.ranges.extend(window.ranges);
        let pushed_zone = self.push_group_zone(&window.properties, window.span, line);
        let group = EventGroup {
            title,
            style,
            tags,
            properties: window.properties,
            heading_level,
            ..EventGroup::default()
        };
        let index_in_parent = self.open_children_len();
        let last = if window.consumed > 0 {
            lines[i + window.consumed].range.end()
        } else {
            line.range.end()
        };
        self.extent = last;
        self.stack.push(OpenFrame {
            group,
            index_in_parent,
            pushed_zone,
            marker: line.content_range(),
            properties_span: window.span,
            fold_from: line.range.end(),
        });
        1 + window.consumed
    }

    /// Trailing `#tag` words on a `group`/`section` line become group tags
    fn split_group_tags(
        &mut self,
        rest: &str,
        base: TextSize,
        heading: bool,
    ) -> (String, Vec<SmolStr>) {
        if heading || rest.is_empty() {
            return (rest.to_string(), Vec::new());
        }
        let words = words_with_positions(rest);
        let mut cut = words.len();
        while cut > 0 {
            let (_, word) = words[cut - 1];
            let Some(name) = word.strip_prefix('#') else { break };
            if name.is_empty() || !name.chars().all(classify::is_tag_char) {
                break;
            }
            cut -= 1;
        }
        let mut tags = Vec::new();
        for &(start, word) in &words[cut..] {
            tags.push(SmolStr::new(&word[1..]));
            self.ranges.push(Range::new(
                RangeType::Tag,
                TextRange::new(
                    base + TextSize::new(start as u32),
                    base + TextSize::new((start + word.len()) as u32),
                ),
            ));
        }
        let title = match words[..cut].last() {
            Some(&(start, word)) => rest[..start + word.len()].to_string(),
            None => String::new(),
        };
        (title, tags)
    }

    fn push_group_zone(
        &mut self,
        properties: &IndexMap<String, serde_yaml::Value>,
        span: Option<TextRange>,
        line: &Line<'_>,
    ) -> bool {
        let value = properties.get("timezone").or_else(|| properties.get("tz"));
        let Some(value) = value else { return false };
        let raw = match value {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        match Zone::parse(&raw) {
            Ok(zone) => {
                self.zones.push(zone);
                true
            }
            Err(err) => {
                tracing::debug!("[PARSE] {err}, keeping the enclosing zone");
                let range = span.unwrap_or_else(|| line.content_range());
                self.diagnostics.push(ParseDiagnostic::new(
                    err.to_string(),
                    range,
                    DiagnosticCode::E0302,
                ));
                false
            }
        }
    }

    fn close_group(&mut self, end: TextSize) {
        let Some(frame) = self.stack.pop() else { return };
        let mut group = frame.group;
        group.ranges = Some(GroupRanges {
            whole: TextRange::new(frame.marker.start(), end),
            marker: frame.marker,
            properties: frame.properties_span,
        });
        if frame.pushed_zone {
            self.zones.pop();
        }
        if end > frame.fold_from {
            let kind = match group.style {
                GroupStyle::Group => FoldKind::Group,
                GroupStyle::Section => FoldKind::Section,
            };
            let fold = FoldRegion::new(
                kind,
                TextRange::new(frame.marker.start(), end),
                frame.fold_from,
            );
            self.folds.insert(fold.key(), fold);
        }
        let node = Node::Group(group);
        match self.stack.last_mut() {
            Some(parent) => parent.group.children.push(node),
            None => self.root.children.push(node),
        }
    }

    /// A level-`L` heading first closes every open group at or below the
    /// outermost open heading of level ≥ `L`
    fn close_headings(&mut self, level: u8) {
        let Some(keep) = self
            .stack
            .iter()
            .position(|f| f.group.heading_level.is_some_and(|h| h >= level))
        else {
            return;
        };
        while self.stack.len() > keep {
            self.close_group(self.extent);
        }
    }

    // =========================================================================
    // Events and body lines
    // =========================================================================

    fn content(&mut self, line: &Line<'_>, lines: &[Line<'_>], i: usize, cache: &mut ParseCache) -> usize {
        let zone = self.zone();
        let recognized =
            dates::recognize(line.text, self.day_first, Some(cache.zone(&zone.key())));
        if let Some(found) = recognized {
            self.finish_pending();
            return self.event_line(found, line, lines, i, cache);
        }
        if self.pending.is_some() {
            self.supplemental_line(line);
            return 1;
        }
        self.extent = line.range.end();
        1
    }

    fn event_line(
        &mut self,
        found: EventDateMatch,
        line: &Line<'_>,
        lines: &[Line<'_>],
        i: usize,
        cache: &mut ParseCache,
    ) -> usize {
        let base = line.range.start();
        let date_span = found.date_range + base;
        let literal =
            &line.text[usize::from(found.date_range.start())..usize::from(found.date_range.end())];
        let zone = self.zone();
        let resolved = {
            let mut env = ResolveEnv {
                zone,
                day_first: self.day_first,
                now: self.now,
                prior: self.prior,
                ids: &self.id_ranges,
                tables: Some(cache.zone(&zone.key())),
            };
            resolve::resolve(&found.parsed, literal, &mut env)
        };
        for issue in &resolved.issues {
            let diagnostic = match issue {
                ResolveIssue::MissingReference(id) => ParseDiagnostic::new(
                    format!("no event with id `!{id}`, resolving against now"),
                    date_span,
                    DiagnosticCode::E0201,
                ),
                ResolveIssue::NoPriorEvent => ParseDiagnostic::new(
                    "relative date has no prior event to anchor on, resolving against now",
                    date_span,
                    DiagnosticCode::E0202,
                ),
            };
            self.diagnostics.push(diagnostic);
        }
        if resolved.range.to < resolved.range.from {
            self.diagnostics.push(ParseDiagnostic::new(
                DiagnosticCode::E0101.default_message(),
                date_span,
                DiagnosticCode::E0101,
            ));
        }

        self.ranges.push(Range::new(RangeType::DateRange, date_span));
        let colon = base + found.colon;
        self.ranges.push(Range::new(
            RangeType::DateRangeColon,
            TextRange::new(colon, colon + TextSize::new(1)),
        ));
        let recurrence_span = found.recurrence.as_ref().map(|(_, span)| *span + base);
        let recurrence = found.recurrence.as_ref().map(|(raw, _)| {
            resolve::resolve_recurrence(raw, resolved.range, zone, self.now)
        });
        if let Some(span) = recurrence_span {
            self.ranges.push(Range::new(RangeType::Recurrence, span));
        }

        let text_start = usize::from(found.colon) + 1;
        let text = &line.text[text_start..];
        let text_base = base + TextSize::new(text_start as u32);
        let mut first = body::first_line(text, text_base);
        body::inline_ranges(text, text_base, &mut first.ranges);
        self.ranges.append(&mut first.ranges);

        let window = properties::scan(&lines[i + 1..]);
        self.ranges.extend(window.ranges);
        let id = first.id.or_else(|| {
            window
                .properties
                .get("id")
                .and_then(|v| v.as_str())
                .map(SmolStr::new)
        });
        let whole_end = if window.consumed > 0 {
            lines[i + window.consumed].range.end()
        } else {
            line.range.end()
        };
        let event = Event {
            title: first.title,
            dates: resolved.range,
            id,
            tags: first.tags,
            completed: first.completed,
            percent: first.percent,
            is_relative: found.parsed.is_clock_dependent(),
            recurrence,
            supplemental: Vec::new(),
            ranges: EventRanges {
                whole: TextRange::new(base, whole_end),
                date_part: date_span,
                recurrence: recurrence_span,
                properties: window.span,
            },
        };
        let path = self.next_path();
        self.extent = whole_end;
        self.pending = Some(PendingEvent {
            event,
            path,
            fold_from: line.range.end(),
            extent: whole_end,
        });
        1 + window.consumed
    }

    fn supplemental_line(&mut self, line: &Line<'_>) {
        let content = line.content_range();
        let block = body::supplemental(line.text, content);
        match &block {
            crate::model::SupplementalBlock::Checkbox { .. } => {
                self.ranges.push(Range::new(RangeType::Checkbox, content));
            }
            crate::model::SupplementalBlock::ListItem { .. } => {
                self.ranges.push(Range::new(RangeType::ListItem, content));
            }
            _ => {}
        }
        body::inline_ranges(line.text, line.range.start(), &mut self.ranges);
        if let Some(pending) = &mut self.pending {
            pending.event.supplemental.push(block);
            pending.extent = line.range.end();
        }
        self.extent = line.range.end();
    }

    /// Attach the pending event to the tree and update the cross-line state
    /// later events depend on.
    fn finish_pending(&mut self) {
        let Some(pending) = self.pending.take() else { return };
        let mut event = pending.event;
        event.ranges.whole = TextRange::new(event.ranges.whole.start(), pending.extent);
        if pending.extent > pending.fold_from {
            let fold = FoldRegion::new(
                FoldKind::Event,
                TextRange::new(event.ranges.whole.start(), pending.extent),
                pending.fold_from,
            );
            self.folds.insert(fold.key(), fold);
        }
        if let Some(id) = &event.id {
            // first definition of an id wins
            if !self.ids.contains_key(id) {
                self.ids.insert(id.clone(), pending.path.clone());
                self.id_ranges.insert(id.clone(), event.dates);
            }
        }
        self.prior = Some(event.dates);
        self.earliest = Some(match self.earliest {
            Some(earliest) => earliest.min(event.dates.from),
            None => event.dates.from,
        });
        self.latest = Some(match self.latest {
            Some(latest) => latest.max(event.dates.to),
            None => event.dates.to,
        });
        let span = event.dates.duration();
        if span > TimeDelta::zero() {
            self.max_span = Some(match self.max_span {
                Some(max) => max.max(span),
                None => span,
            });
        }
        match self.stack.last_mut() {
            Some(frame) => frame.group.children.push(Node::Event(event)),
            None => self.root.children.push(Node::Event(event)),
        }
    }

    // =========================================================================
    // Comments and shared state
    // =========================================================================

    fn comment_line(&mut self, line: &Line<'_>) {
        self.ranges
            .push(Range::new(RangeType::Comment, line.content_range()));
        self.extent = line.range.end();
        match &mut self.comments {
            Some(run) => {
                run.last_end = line.range.end();
                run.lines += 1;
            }
            None => {
                self.comments = Some(CommentRun {
                    start: line.range.start(),
                    first_line_end: line.range.end(),
                    last_end: line.range.end(),
                    lines: 1,
                });
            }
        }
    }

    /// A run of two or more comment lines coalesces into one fold region
    fn close_comment_run(&mut self) {
        let Some(run) = self.comments.take() else { return };
        if run.lines < 2 {
            return;
        }
        let fold = FoldRegion::new(
            FoldKind::Comment,
            TextRange::new(run.start, run.last_end),
            run.first_line_end,
        );
        self.folds.insert(fold.key(), fold);
    }

    fn zone(&self) -> Zone {
        self.zones.last().copied().unwrap_or_default()
    }

    fn open_children_len(&self) -> usize {
        match self.stack.last() {
            Some(frame) => frame.group.children.len(),
            None => self.root.children.len(),
        }
    }

    fn next_path(&self) -> Path {
        let mut indices: Vec<usize> = self.stack.iter().map(|f| f.index_in_parent).collect();
        indices.push(self.open_children_len());
        Path::new(indices)
    }
}

/// Whitespace-separated words of `text` with their byte offsets
fn words_with_positions(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                words.push((s, &text[s..idx]));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}
