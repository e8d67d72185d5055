//! The line-oriented document parser.
//!
//! Parsing is a single forward pass over the document's lines. A header scan
//! consumes the front matter, then [`context::ParsingContext`] classifies
//! each remaining line (comment, structural marker, event, body) and builds
//! the event tree, range list, fold table and diagnostics in one go. The
//! parser never fails; malformed input degrades to plain-text lines plus
//! diagnostics.

pub(crate) mod body;
pub(crate) mod classify;
mod context;
mod header;
pub(crate) mod properties;

use chrono::{DateTime, Utc};
use text_size::{TextRange, TextSize};

use crate::cache::ParseCache;
use crate::dates::Zone;
use crate::model::Timeline;

use context::ParsingContext;

/// Caller-supplied parse knobs.
///
/// `now` pins the instant that `now`-anchored and relative dates resolve
/// against, which callers use for reproducible output; left unset, the wall
/// clock is read once per parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Fixed resolution instant; defaults to the wall clock
    pub now: Option<DateTime<Utc>>,
    /// Zone used when the header does not name one
    pub default_zone: Option<Zone>,
}

/// Parse a document with default options and a throwaway cache.
pub fn parse(text: &str) -> Timeline {
    parse_with(text, &ParseOptions::default(), &mut ParseCache::new())
}

/// Parse a document, reusing `cache` across calls.
pub fn parse_with(text: &str, options: &ParseOptions, cache: &mut ParseCache) -> Timeline {
    let lines = split_lines(text);
    let scan = header::scan(&lines);
    let mut i = scan.consumed;
    let mut ctx = ParsingContext::new(options, scan);
    while i < lines.len() {
        i += ctx.step(&lines, i, cache);
    }
    ctx.finish()
}

/// One source line with its byte span, line terminator excluded
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub text: &'a str,
    pub range: TextRange,
}

impl Line<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Span of the line's content with surrounding whitespace trimmed
    pub fn content_range(&self) -> TextRange {
        let trimmed = self.text.trim_end();
        let lead = trimmed.len() - trimmed.trim_start().len();
        TextRange::new(
            self.range.start() + TextSize::new(lead as u32),
            self.range.start() + TextSize::new(trimmed.len() as u32),
        )
    }
}

/// Split `text` into lines, keeping byte offsets; handles `\n` and `\r\n`.
/// The empty document yields no lines, and a trailing newline does not
/// produce a phantom final line.
pub(crate) fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    for raw in text.split_inclusive('\n') {
        let stripped = raw.strip_suffix('\n').unwrap_or(raw);
        let stripped = stripped.strip_suffix('\r').unwrap_or(stripped);
        lines.push(Line {
            text: stripped,
            range: TextRange::new(
                TextSize::new(offset as u32),
                TextSize::new((offset + stripped.len()) as u32),
            ),
        });
        offset += raw.len();
    }
    lines
}
