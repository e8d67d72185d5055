//! The event tree: `Event` leaves under `EventGroup` internal nodes.
//!
//! Nodes are immutable once built; the incremental re-parser remaps their
//! stored text ranges in place but never restructures a mapped tree.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use smol_str::SmolStr;
use text_size::TextRange;

use crate::dates::{DateRange, Recurrence, Zone};

/// How a group was written, which controls how renderers lay it out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupStyle {
    /// `group <title>` … `endGroup`, swimlane style
    Group,
    /// `section <title>` … `endSection`, or a markdown heading
    #[default]
    Section,
}

impl GroupStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Section => "section",
        }
    }
}

/// Aggregate of every descendant event's resolved range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRange {
    /// Earliest start among descendants
    pub min_from: DateTime<Utc>,
    /// Latest end among descendants
    pub max_to: DateTime<Utc>,
    /// Latest start among descendants
    pub latest_from: DateTime<Utc>,
}

/// Text spans recorded on an event for editors and incremental mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRanges {
    /// First line through the last supplemental line
    pub whole: TextRange,
    /// The date expression; protected against incremental mapping
    pub date_part: TextRange,
    /// The recurrence clause; protected against incremental mapping
    pub recurrence: Option<TextRange>,
    /// The property window following the first line
    pub properties: Option<TextRange>,
}

/// Text spans recorded on a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRanges {
    /// Marker line through the last descendant line
    pub whole: TextRange,
    /// The `group`/`section`/heading line itself
    pub marker: TextRange,
    /// The property window following the marker line
    pub properties: Option<TextRange>,
}

/// One body line under an event's first line
#[derive(Debug, Clone, PartialEq)]
pub enum SupplementalBlock {
    /// `- some text`
    ListItem { text: String, range: TextRange },
    /// `- [ ] open` / `- [x] done`
    Checkbox {
        text: String,
        checked: bool,
        range: TextRange,
    },
    /// A line that is entirely `![alt](url)`
    Image {
        alt: String,
        url: String,
        range: TextRange,
    },
    /// Any other non-blank body line
    Text { text: String, range: TextRange },
}

impl SupplementalBlock {
    pub fn range(&self) -> TextRange {
        match self {
            Self::ListItem { range, .. }
            | Self::Checkbox { range, .. }
            | Self::Image { range, .. }
            | Self::Text { range, .. } => *range,
        }
    }

    pub(crate) fn range_mut(&mut self) -> &mut TextRange {
        match self {
            Self::ListItem { range, .. }
            | Self::Checkbox { range, .. }
            | Self::Image { range, .. }
            | Self::Text { range, .. } => range,
        }
    }
}

/// A leaf node: one dated entry
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// First-line text after the colon; a leading checkbox is stripped,
    /// other markers (`!id`, `#tag`, `NN%`) stay in the text
    pub title: String,
    /// Resolved absolute range
    pub dates: DateRange,
    /// `!id` from the text, or an `id:` property
    pub id: Option<SmolStr>,
    /// `#tag` occurrences in the first line
    pub tags: Vec<SmolStr>,
    /// Leading `[ ]`/`[x]` checkbox state, if any
    pub completed: Option<bool>,
    /// `NN%` completion, if any
    pub percent: Option<u8>,
    /// Whether the date expression depends on another event or "now"
    pub is_relative: bool,
    pub recurrence: Option<Recurrence>,
    /// Body lines following the first line
    pub supplemental: Vec<SupplementalBlock>,
    pub ranges: EventRanges,
}

impl Event {
    /// Plain-text body: the `Text` supplemental lines joined with newlines
    pub fn description(&self) -> Option<String> {
        let lines: Vec<&str> = self
            .supplemental
            .iter()
            .filter_map(|block| match block {
                SupplementalBlock::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    /// Concrete instance ranges of the recurrence rule, base range first;
    /// an event without a rule yields just its own range.
    pub fn expand_recurrence(&self, zone: Zone, limit: usize) -> Vec<DateRange> {
        match &self.recurrence {
            Some(rule) => rule.expand(self.dates, zone, limit),
            None => vec![self.dates],
        }
    }
}

/// An internal node: ordered children plus group metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventGroup {
    pub title: String,
    pub style: GroupStyle,
    pub tags: Vec<SmolStr>,
    /// `key: value` property lines, YAML-decoded
    pub properties: IndexMap<String, serde_yaml::Value>,
    pub children: Vec<Node>,
    /// Cached range aggregate; `None` when no descendant event exists
    pub aggregate: Option<GroupRange>,
    /// Markdown-heading level (1-6) when opened by a heading
    pub heading_level: Option<u8>,
    /// `None` only for the implicit root
    pub ranges: Option<GroupRanges>,
}

impl EventGroup {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Recompute `aggregate` bottom-up over the whole subtree
    pub fn recompute_aggregate(&mut self) {
        for child in &mut self.children {
            if let Node::Group(group) = child {
                group.recompute_aggregate();
            }
        }
        let mut aggregate: Option<GroupRange> = None;
        for child in &self.children {
            let (from, to, latest_from) = match child {
                Node::Event(event) => (event.dates.from, event.dates.to, event.dates.from),
                Node::Group(group) => match &group.aggregate {
                    Some(a) => (a.min_from, a.max_to, a.latest_from),
                    None => continue,
                },
            };
            aggregate = Some(match aggregate {
                None => GroupRange {
                    min_from: from,
                    max_to: to,
                    latest_from,
                },
                Some(a) => GroupRange {
                    min_from: a.min_from.min(from),
                    max_to: a.max_to.max(to),
                    latest_from: a.latest_from.max(latest_from),
                },
            });
        }
        self.aggregate = aggregate;
    }

    pub(crate) fn for_each_event_mut(&mut self, f: &mut impl FnMut(&mut Event)) {
        for child in &mut self.children {
            match child {
                Node::Event(event) => f(event),
                Node::Group(group) => group.for_each_event_mut(f),
            }
        }
    }
}

/// A tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Event(Event),
    Group(EventGroup),
}

impl Node {
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&EventGroup> {
        match self {
            Self::Event(_) => None,
            Self::Group(group) => Some(group),
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// The node's source span
    pub fn whole_range(&self) -> Option<TextRange> {
        match self {
            Self::Event(event) => Some(event.ranges.whole),
            Self::Group(group) => group.ranges.map(|r| r.whole),
        }
    }

    /// The node's resolved time range; a group uses its aggregate
    pub fn date_range(&self) -> Option<DateRange> {
        match self {
            Self::Event(event) => Some(event.dates),
            Self::Group(group) => group.aggregate.map(|a| DateRange {
                from: a.min_from,
                to: a.max_to,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn event(from: &str, to: &str) -> Event {
        Event {
            title: String::new(),
            dates: DateRange {
                from: instant(from),
                to: instant(to),
            },
            id: None,
            tags: Vec::new(),
            completed: None,
            percent: None,
            is_relative: false,
            recurrence: None,
            supplemental: Vec::new(),
            ranges: EventRanges {
                whole: TextRange::empty(0.into()),
                date_part: TextRange::empty(0.into()),
                recurrence: None,
                properties: None,
            },
        }
    }

    #[test]
    fn test_aggregate_spans_descendants() {
        let mut inner = EventGroup::default();
        inner
            .children
            .push(Node::Event(event("2022-03-01T00:00:00Z", "2022-04-01T00:00:00Z")));
        let mut root = EventGroup::default();
        root.children
            .push(Node::Event(event("2022-01-01T00:00:00Z", "2022-02-01T00:00:00Z")));
        root.children.push(Node::Group(inner));
        root.recompute_aggregate();

        let aggregate = root.aggregate.unwrap();
        assert_eq!(aggregate.min_from, instant("2022-01-01T00:00:00Z"));
        assert_eq!(aggregate.max_to, instant("2022-04-01T00:00:00Z"));
        assert_eq!(aggregate.latest_from, instant("2022-03-01T00:00:00Z"));
    }

    #[test]
    fn test_empty_group_has_no_aggregate() {
        let mut group = EventGroup::default();
        group.children.push(Node::Group(EventGroup::default()));
        group.recompute_aggregate();
        assert!(group.aggregate.is_none());
    }

    #[test]
    fn test_description_joins_text_blocks() {
        let mut e = event("2022-01-01T00:00:00Z", "2022-01-02T00:00:00Z");
        assert_eq!(e.description(), None);
        e.supplemental = vec![
            SupplementalBlock::Text {
                text: "first".into(),
                range: TextRange::empty(0.into()),
            },
            SupplementalBlock::ListItem {
                text: "item".into(),
                range: TextRange::empty(0.into()),
            },
            SupplementalBlock::Text {
                text: "second".into(),
                range: TextRange::empty(0.into()),
            },
        ];
        assert_eq!(e.description().as_deref(), Some("first\nsecond"));
    }
}
