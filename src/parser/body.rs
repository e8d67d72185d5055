//! Event text extraction.
//!
//! The first line after the terminator colon carries the title plus inline
//! markers: a leading checkbox, `#tag`s, an `!id`, a completion percent.
//! Later body lines become supplemental blocks: list items, checklist
//! items, standalone images, or plain text.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use unicode_ident::{is_xid_continue, is_xid_start};

use crate::base::{Range, RangeType};
use crate::model::SupplementalBlock;

use super::classify::is_tag_char;

/// Markers pulled out of an event's first-line text
#[derive(Debug, Default)]
pub(crate) struct FirstLine {
    /// The text with the leading checkbox stripped, trimmed
    pub title: String,
    /// First `!id` word, if any
    pub id: Option<SmolStr>,
    pub tags: Vec<SmolStr>,
    pub completed: Option<bool>,
    pub percent: Option<u8>,
    pub ranges: Vec<Range>,
}

/// Scan the first-line text after the colon. `base` is the absolute offset
/// of `text` in the document.
pub(crate) fn first_line(text: &str, base: TextSize) -> FirstLine {
    let mut out = FirstLine::default();
    let trimmed = text.trim_start();
    let lead = text.len() - trimmed.len();
    let mut rest = trimmed;
    let mut rest_offset = lead;
    for (marker, checked) in [("[]", false), ("[ ]", false), ("[x]", true), ("[X]", true)] {
        if let Some(after) = trimmed.strip_prefix(marker) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                out.completed = Some(checked);
                out.ranges.push(Range::new(
                    RangeType::Checkbox,
                    span(base, lead, lead + marker.len()),
                ));
                rest = after;
                rest_offset = lead + marker.len();
                break;
            }
        }
    }
    scan_markers(rest, base, rest_offset, &mut out);
    out.title = rest.trim().to_string();
    out
}

/// Tags, the event id and a percent marker, each only at a word boundary
fn scan_markers(rest: &str, base: TextSize, rest_offset: usize, out: &mut FirstLine) {
    let mut pos = 0;
    let mut boundary = true;
    while let Some(c) = rest[pos..].chars().next() {
        if boundary {
            if c == '#' {
                let len = tag_len(&rest[pos + 1..]);
                if len > 0 {
                    out.tags.push(SmolStr::new(&rest[pos + 1..pos + 1 + len]));
                    out.ranges.push(Range::new(
                        RangeType::Tag,
                        span(base, rest_offset + pos, rest_offset + pos + 1 + len),
                    ));
                    pos += 1 + len;
                    boundary = false;
                    continue;
                }
            } else if c == '!' {
                let len = id_len(&rest[pos + 1..]);
                if len > 0 {
                    if out.id.is_none() {
                        out.id = Some(SmolStr::new(&rest[pos + 1..pos + 1 + len]));
                    }
                    out.ranges.push(Range::new(
                        RangeType::EventId,
                        span(base, rest_offset + pos, rest_offset + pos + 1 + len),
                    ));
                    pos += 1 + len;
                    boundary = false;
                    continue;
                }
            } else if c.is_ascii_digit() {
                let digits = rest[pos..]
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .count();
                if rest[pos + digits..].starts_with('%') {
                    if out.percent.is_none() {
                        out.percent = rest[pos..pos + digits]
                            .parse::<u32>()
                            .ok()
                            .filter(|&p| p <= 100)
                            .map(|p| p as u8);
                    }
                    if out.percent.is_some() {
                        out.ranges.push(Range::new(
                            RangeType::Percent,
                            span(base, rest_offset + pos, rest_offset + pos + digits + 1),
                        ));
                    }
                    pos += digits + 1;
                    boundary = false;
                    continue;
                }
            }
        }
        boundary = c.is_whitespace();
        pos += c.len_utf8();
    }
}

/// Classify one body line under an event
pub(crate) fn supplemental(line: &str, range: TextRange) -> SupplementalBlock {
    let trimmed = line.trim();
    if let Some(item) = trimmed.strip_prefix('-') {
        if item.starts_with(char::is_whitespace) {
            let item = item.trim_start();
            for (marker, checked) in [("[]", false), ("[ ]", false), ("[x]", true), ("[X]", true)] {
                if let Some(after) = item.strip_prefix(marker) {
                    if after.is_empty() || after.starts_with(char::is_whitespace) {
                        return SupplementalBlock::Checkbox {
                            text: after.trim().to_string(),
                            checked,
                            range,
                        };
                    }
                }
            }
            return SupplementalBlock::ListItem {
                text: item.trim_end().to_string(),
                range,
            };
        }
    }
    if let Some(after) = trimmed.strip_prefix('!') {
        if after.starts_with('[') {
            if let Some((alt, url, consumed)) = link_parts(after) {
                if after[consumed..].trim().is_empty() {
                    return SupplementalBlock::Image {
                        alt: alt.to_string(),
                        url: url.to_string(),
                        range,
                    };
                }
            }
        }
    }
    SupplementalBlock::Text {
        text: trimmed.to_string(),
        range,
    }
}

/// Record `![alt](url)` and `[text](url)` occurrences in `text`
pub(crate) fn inline_ranges(text: &str, base: TextSize, out: &mut Vec<Range>) {
    let mut pos = 0;
    while let Some(found) = text[pos..].find('[') {
        let at = pos + found;
        match link_parts(&text[at..]) {
            Some((_, _, consumed)) => {
                let is_image = text[..at].ends_with('!');
                let (kind, start) = if is_image {
                    (RangeType::Image, at - 1)
                } else {
                    (RangeType::Link, at)
                };
                out.push(Range::new(kind, span(base, start, at + consumed)));
                pos = at + consumed;
            }
            None => pos = at + 1,
        }
    }
}

/// Split `[a](b)…` into `(a, b, bytes consumed)`; no nesting
fn link_parts(text: &str) -> Option<(&str, &str, usize)> {
    let close = text.find(']')?;
    let after = &text[close + 1..];
    let url_text = after.strip_prefix('(')?;
    let end = url_text.find(')')?;
    Some((&text[1..close], &url_text[..end], close + 3 + end))
}

fn tag_len(text: &str) -> usize {
    text.chars()
        .take_while(|&c| is_tag_char(c))
        .map(char::len_utf8)
        .sum()
}

fn id_len(text: &str) -> usize {
    let mut chars = text.chars();
    let Some(first) = chars.next() else { return 0 };
    if !(is_xid_start(first) || first == '_') {
        return 0;
    }
    first.len_utf8()
        + chars
            .take_while(|&c| is_xid_continue(c) || c == '-')
            .map(char::len_utf8)
            .sum::<usize>()
}

fn span(base: TextSize, start: usize, end: usize) -> TextRange {
    TextRange::new(
        base + TextSize::new(start as u32),
        base + TextSize::new(end as u32),
    )
}
