//! `key: value` property windows.
//!
//! A property window is the run of lines immediately following an event or
//! group first line, closed by a blank line or anything that is not a
//! property. Keys are bare identifiers with a glued colon; deeper-indented
//! lines continue the previous key, so nested YAML works. The whole window
//! is decoded with serde_yaml; an undecodable window degrades to per-line
//! string pairs.

use indexmap::IndexMap;
use text_size::TextRange;

use crate::base::{Range, RangeType};

use super::Line;

/// A consumed property window
#[derive(Debug, Default)]
pub(crate) struct PropertyWindow {
    pub properties: IndexMap<String, serde_yaml::Value>,
    /// Lines consumed after the marker line
    pub consumed: usize,
    /// Span of the whole window
    pub span: Option<TextRange>,
    pub ranges: Vec<Range>,
}

/// Scan the lines following a marker line. `lines` starts at the first
/// candidate line.
pub(crate) fn scan(lines: &[Line<'_>]) -> PropertyWindow {
    let mut window = PropertyWindow::default();
    let Some(first) = lines.first() else {
        return window;
    };
    if first.is_blank() || property_key(first.text).is_none() {
        return window;
    }
    let base_indent = indent_of(first.text);
    let mut end = 1;
    while let Some(line) = lines.get(end) {
        if line.is_blank() {
            break;
        }
        let indent = indent_of(line.text);
        let continues = indent > base_indent
            || (indent == base_indent && property_key(line.text).is_some());
        if !continues {
            break;
        }
        end += 1;
    }

    for line in &lines[..end] {
        window
            .ranges
            .push(Range::new(RangeType::Property, line.content_range()));
    }
    window.consumed = end;
    window.span = Some(TextRange::new(
        lines[0].range.start(),
        lines[end - 1].range.end(),
    ));

    let text: String = lines[..end]
        .iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n");
    window.properties = match serde_yaml::from_str::<serde_yaml::Mapping>(&text) {
        Ok(mapping) => mapping
            .into_iter()
            .filter_map(|(key, value)| Some((key.as_str()?.to_string(), value)))
            .collect(),
        Err(err) => {
            tracing::debug!("[PARSE] property window is not valid YAML ({err}), keeping string pairs");
            lines[..end]
                .iter()
                .filter_map(|line| property_key(line.text))
                .map(|(key, value)| (key.to_string(), serde_yaml::Value::String(value.to_string())))
                .collect()
        }
    };
    window
}

/// Split a `key: value` line; the key is `[A-Za-z_][A-Za-z0-9_-]*` with a
/// glued colon, and the colon must be followed by whitespace or nothing
/// (so a bare `https://…` line is not a property).
pub(crate) fn property_key(text: &str) -> Option<(&str, &str)> {
    let trimmed = text.trim_start();
    let first = trimmed.chars().next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    let len = trimmed
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .count();
    let value = trimmed[len..].strip_prefix(':')?;
    if !(value.is_empty() || value.starts_with(char::is_whitespace)) {
        return None;
    }
    Some((&trimmed[..len], value.trim()))
}

fn indent_of(text: &str) -> usize {
    text.len() - text.trim_start().len()
}
