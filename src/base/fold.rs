//! Foldable source regions.
//!
//! A fold region is a span the editor may collapse: a run of comment lines,
//! an event with its body, a group with its children, or the header block.
//! The region keeps the offset where folding visually begins (`fold_from`,
//! the end of the introducing line) separate from the full span so the first
//! line stays visible when collapsed.

use text_size::{TextRange, TextSize};

/// Kind of foldable region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldKind {
    /// Consecutive `// …` lines
    Comment,
    /// An event line plus its body (properties and supplemental lines)
    Event,
    /// A `group`/`endGroup` pair
    Group,
    /// A `section`/heading region
    Section,
    /// The header block
    Header,
}

impl FoldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Event => "event",
            Self::Group => "group",
            Self::Section => "section",
            Self::Header => "header",
        }
    }
}

/// A foldable span of the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldRegion {
    pub kind: FoldKind,
    /// Whole region, including the introducing line
    pub range: TextRange,
    /// Offset where collapsing starts (end of the introducing line)
    pub fold_from: TextSize,
}

impl FoldRegion {
    pub fn new(kind: FoldKind, range: TextRange, fold_from: TextSize) -> Self {
        Self {
            kind,
            range,
            fold_from,
        }
    }

    /// Key used in the fold-region table: the region's starting offset
    pub fn key(&self) -> u32 {
        self.range.start().into()
    }
}
