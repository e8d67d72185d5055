//! Structural line recognition.
//!
//! Recognizers run in a fixed priority order and the first match wins:
//! comment > tag definition > group/section start > group/section end >
//! markdown heading. Event lines are not recognized here (they need the
//! date resolver), and property/body lines depend on what came before them.

use text_size::{TextRange, TextSize};

use crate::model::GroupStyle;

/// A recognized non-event structural line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StructuralLine<'a> {
    /// `#name: value`, a tag color/metadata binding
    TagDefinition {
        name: &'a str,
        value: &'a str,
        /// Span of `#name` within the line
        name_range: TextRange,
    },
    /// `group <title…>` / `section <title…>`
    GroupStart {
        style: GroupStyle,
        /// Everything after the keyword, tags still attached
        rest: &'a str,
        /// Offset of `rest` within the line
        rest_start: TextSize,
    },
    /// `endGroup` / `endSection`
    GroupEnd,
    /// `#`–`######` + whitespace + title
    Heading { level: u8, title: &'a str },
}

/// `// …` lines suppress every other recognizer, so the caller checks this
/// first and separately (comment runs coalesce into fold regions).
pub(crate) fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

/// Characters allowed in a `#tag` name
pub(crate) fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

pub(crate) fn classify(line: &str) -> Option<StructuralLine<'_>> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    tag_definition(trimmed, indent)
        .or_else(|| group_marker(trimmed, indent))
        .or_else(|| group_end(trimmed))
        .or_else(|| heading(trimmed))
}

fn tag_definition(trimmed: &str, indent: usize) -> Option<StructuralLine<'_>> {
    let name_text = trimmed.strip_prefix('#')?;
    let name_len: usize = name_text
        .chars()
        .take_while(|&c| is_tag_char(c))
        .map(char::len_utf8)
        .sum();
    if name_len == 0 {
        return None;
    }
    let value = name_text[name_len..].strip_prefix(':')?.trim();
    if value.is_empty() {
        return None;
    }
    let start = TextSize::new(indent as u32);
    Some(StructuralLine::TagDefinition {
        name: &name_text[..name_len],
        value,
        name_range: TextRange::new(start, start + TextSize::new(1 + name_len as u32)),
    })
}

fn group_marker(trimmed: &str, indent: usize) -> Option<StructuralLine<'_>> {
    let (keyword, style) = if trimmed.starts_with("group") {
        ("group", GroupStyle::Group)
    } else if trimmed.starts_with("section") {
        ("section", GroupStyle::Section)
    } else {
        return None;
    };
    let after = &trimmed[keyword.len()..];
    // "groups of things" is plain text
    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = after.trim_start().trim_end();
    let rest_start = indent + keyword.len() + (after.len() - after.trim_start().len());
    Some(StructuralLine::GroupStart {
        style,
        rest,
        rest_start: TextSize::new(rest_start as u32),
    })
}

fn group_end(trimmed: &str) -> Option<StructuralLine<'_>> {
    for keyword in ["endGroup", "endSection"] {
        if let Some(after) = trimmed.strip_prefix(keyword) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return Some(StructuralLine::GroupEnd);
            }
        }
    }
    None
}

fn heading(trimmed: &str) -> Option<StructuralLine<'_>> {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let after = &trimmed[hashes..];
    let title = after.trim_start();
    // no whitespace after the hashes means `#tag`-style text, not a heading
    if title.len() == after.len() {
        return None;
    }
    Some(StructuralLine::Heading {
        level: hashes as u8,
        title: title.trim_end(),
    })
}
