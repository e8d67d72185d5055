//! The finished parse result.

use chrono::{DateTime, TimeDelta, Utc};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextSize;

use crate::base::{FoldRegion, Range};
use crate::model::diagnostics::{DocumentMessage, ParseDiagnostic};
use crate::model::header::Header;
use crate::model::node::{Event, EventGroup, Node};
use crate::model::path::Path;

/// Preferred display granularity, derived from the widest event span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayScale {
    Hours,
    #[default]
    Days,
    Months,
    Years,
    Decades,
}

impl DisplayScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Months => "months",
            Self::Years => "years",
            Self::Decades => "decades",
        }
    }

    /// Pick a scale such that the span covers a handful of display units
    pub fn from_span(span: TimeDelta) -> Self {
        let days = span.num_days();
        if days < 2 {
            Self::Hours
        } else if days < 60 {
            Self::Days
        } else if days < 365 * 2 {
            Self::Months
        } else if days < 365 * 20 {
            Self::Years
        } else {
            Self::Decades
        }
    }
}

/// Document-level metadata accumulated across the parse
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Metadata {
    /// Header `title:`
    pub title: Option<String>,
    /// Header `description:`
    pub description: Option<String>,
    /// Earliest event start, the default chart lower bound
    pub earliest: Option<DateTime<Utc>>,
    /// Latest event end, the default chart upper bound
    pub latest: Option<DateTime<Utc>>,
    /// Widest single event span
    pub max_span: Option<TimeDelta>,
    pub scale: DisplayScale,
}

/// The ordered tree plus everything editors and exporters consume
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Timeline {
    /// The implicit root group; its children are the top-level nodes
    pub root: EventGroup,
    /// Tagged source spans, sorted by `(start, end)`
    pub ranges: Vec<Range>,
    /// Fold regions keyed by starting offset
    pub folds: FxHashMap<u32, FoldRegion>,
    pub header: Header,
    /// First definition of each `!id` wins
    pub ids: FxHashMap<SmolStr, Path>,
    pub diagnostics: Vec<ParseDiagnostic>,
    pub messages: Vec<DocumentMessage>,
    pub metadata: Metadata,
}

impl Timeline {
    /// The node addressed by `path`. The empty path addresses the root
    /// group, which is not a `Node`; use [`Timeline::root`] for that.
    pub fn node_at(&self, path: &Path) -> Option<&Node> {
        let mut indices = path.indices().iter();
        let mut node = self.root.children.get(*indices.next()?)?;
        for &index in indices {
            node = node.as_group()?.children.get(index)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let mut indices = path.indices().iter();
        let mut node = self.root.children.get_mut(*indices.next()?)?;
        for &index in indices {
            match node {
                Node::Group(group) => node = group.children.get_mut(index)?,
                Node::Event(_) => return None,
            }
        }
        Some(node)
    }

    /// Depth-first traversal of all events, in document order
    pub fn iter_events(&self) -> EventIter<'_> {
        EventIter {
            stack: vec![(&self.root.children, 0, Path::root())],
        }
    }

    pub(crate) fn for_each_event_mut(&mut self, mut f: impl FnMut(&mut Event)) {
        self.root.for_each_event_mut(&mut f);
    }

    /// Path of the deepest node whose source span contains `offset`
    pub fn node_path_at_offset(&self, offset: TextSize) -> Option<Path> {
        fn descend(nodes: &[Node], base: &Path, offset: TextSize, best: &mut Option<Path>) {
            for (index, node) in nodes.iter().enumerate() {
                let Some(whole) = node.whole_range() else {
                    continue;
                };
                if whole.start() <= offset && offset < whole.end() {
                    let path = base.child(index);
                    *best = Some(path.clone());
                    if let Node::Group(group) = node {
                        descend(&group.children, &path, offset, best);
                    }
                }
            }
        }
        let mut best = None;
        descend(&self.root.children, &Path::root(), offset, &mut best);
        best
    }
}

/// Iterator over `(Path, &Event)` in document order
pub struct EventIter<'a> {
    stack: Vec<(&'a [Node], usize, Path)>,
}

impl<'a> Iterator for EventIter<'a> {
    type Item = (Path, &'a Event);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (nodes, index, base) = self.stack.last_mut()?;
            if *index >= nodes.len() {
                self.stack.pop();
                continue;
            }
            let node = &nodes[*index];
            let path = base.child(*index);
            *index += 1;
            match node {
                Node::Event(event) => return Some((path, event)),
                Node::Group(group) => self.stack.push((&group.children, 0, path)),
            }
        }
    }
}
