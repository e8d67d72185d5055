//! Header block scanning.
//!
//! Everything before the first event or structural body line can be header:
//! a `---`-fenced YAML front matter block, or a bare run of `key: value`
//! lines. Tag definitions (`#name: value`) and `//` comments may sit inside
//! the block; both would confuse the YAML decoder, so they are blanked out
//! of the buffer and recorded separately.

use smol_str::SmolStr;
use text_size::TextRange;

use crate::base::{FoldKind, FoldRegion, Range, RangeType};
use crate::dates;
use crate::model::{DateFormat, DiagnosticCode, Header, ParseDiagnostic, Severity};

use super::classify::{self, StructuralLine};
use super::properties;
use super::Line;

/// The consumed header prefix of a document
#[derive(Debug, Default)]
pub(crate) struct HeaderScan {
    pub header: Header,
    /// Lines consumed from the top of the document
    pub consumed: usize,
    pub ranges: Vec<Range>,
    pub fold: Option<FoldRegion>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

pub(crate) fn scan(lines: &[Line<'_>]) -> HeaderScan {
    let mut scan = HeaderScan::default();
    let Some(first) = lines.iter().position(|l| !l.is_blank()) else {
        return scan;
    };
    if lines[first].text.trim() == "---" {
        fenced(lines, first, &mut scan);
    } else {
        bare(lines, first, &mut scan);
    }
    scan
}

fn fenced(lines: &[Line<'_>], open: usize, scan: &mut HeaderScan) {
    let Some(close) = lines[open + 1..].iter().position(|l| l.text.trim() == "---") else {
        // a stray `---` is not a header
        scan.diagnostics.push(
            ParseDiagnostic::new(
                "unterminated `---` header fence",
                lines[open].content_range(),
                DiagnosticCode::E0303,
            )
            .with_severity(Severity::Warning),
        );
        return;
    };
    let close = open + 1 + close;
    scan.ranges.push(Range::new(
        RangeType::HeaderFence,
        lines[open].content_range(),
    ));
    scan.ranges.push(Range::new(
        RangeType::HeaderFence,
        lines[close].content_range(),
    ));
    decode(&lines[open + 1..close], scan);
    let range = TextRange::new(lines[open].range.start(), lines[close].range.end());
    scan.header.range = Some(range);
    scan.consumed = close + 1;
    scan.fold = Some(FoldRegion::new(
        FoldKind::Header,
        range,
        lines[open].range.end(),
    ));
}

fn bare(lines: &[Line<'_>], first: usize, scan: &mut HeaderScan) {
    let mut last = None;
    let mut keyed = false;
    for (i, line) in lines.iter().enumerate().skip(first) {
        if line.is_blank() || classify::is_comment(line.text) {
            // included only when a later key line extends the block
            continue;
        }
        match classify::classify(line.text) {
            Some(StructuralLine::TagDefinition { .. }) => {
                keyed = true;
                last = Some(i);
                continue;
            }
            Some(_) => break,
            None => {}
        }
        if dates::recognize(line.text, false, None).is_some() {
            // the first event line ends the header
            break;
        }
        if properties::property_key(line.text).is_some() {
            keyed = true;
            last = Some(i);
            continue;
        }
        let trimmed = line.text.trim_start();
        let continuation = keyed
            && (line.text.starts_with(char::is_whitespace)
                || trimmed == "-"
                || trimmed.starts_with("- "));
        if continuation {
            last = Some(i);
            continue;
        }
        break;
    }
    let Some(last) = last else { return };
    decode(&lines[first..=last], scan);
    let range = TextRange::new(lines[first].range.start(), lines[last].range.end());
    scan.header.range = Some(range);
    scan.consumed = last + 1;
    if last > first {
        scan.fold = Some(FoldRegion::new(
            FoldKind::Header,
            range,
            lines[first].range.end(),
        ));
    }
}

/// YAML-decode a block, with tag definitions and comments blanked out
fn decode(block: &[Line<'_>], scan: &mut HeaderScan) {
    let mut parts: Vec<&str> = Vec::with_capacity(block.len());
    for line in block {
        if classify::is_comment(line.text) {
            scan.ranges
                .push(Range::new(RangeType::Comment, line.content_range()));
            parts.push("");
            continue;
        }
        if let Some(StructuralLine::TagDefinition {
            name,
            value,
            name_range,
        }) = classify::classify(line.text)
        {
            scan.header.tags.insert(SmolStr::new(name), value.to_string());
            scan.ranges.push(Range::new(
                RangeType::TagDefinition,
                name_range + line.range.start(),
            ));
            parts.push("");
            continue;
        }
        parts.push(line.text);
    }
    let text = parts.join("\n");
    if text.trim().is_empty() {
        return;
    }
    match serde_yaml::from_str::<serde_yaml::Mapping>(&text) {
        Ok(mapping) => extract(mapping, &mut scan.header),
        Err(err) => {
            tracing::debug!("[PARSE] header is not valid YAML ({err}), keeping string pairs");
            let range = TextRange::new(block[0].range.start(), block[block.len() - 1].range.end());
            scan.diagnostics.push(
                ParseDiagnostic::new(
                    format!("header is not valid YAML: {err}"),
                    range,
                    DiagnosticCode::E0303,
                )
                .with_severity(Severity::Warning),
            );
            let mut mapping = serde_yaml::Mapping::new();
            for line in block {
                if let Some((key, value)) = properties::property_key(line.text) {
                    mapping.insert(
                        serde_yaml::Value::String(key.to_string()),
                        serde_yaml::Value::String(value.to_string()),
                    );
                }
            }
            extract(mapping, &mut scan.header);
        }
    }
}

fn extract(mapping: serde_yaml::Mapping, header: &mut Header) {
    for (key, value) in &mapping {
        let Some(key) = key.as_str() else { continue };
        match key {
            "title" => header.title = scalar(value),
            "description" => header.description = scalar(value),
            "timezone" | "tz" => header.timezone = zone_scalar(value),
            "dateFormat" => {
                if let Some(format) = scalar(value) {
                    header.date_format = DateFormat::from_value(&format);
                }
            }
            "view" => header.view = strings(value),
            "edit" => header.edit = strings(value),
            _ => {}
        }
    }
    header.raw = mapping;
}

fn scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// YAML reads `tz: +2` as the integer 2, losing the sign, so bare numbers
/// get an explicit one put back
fn zone_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => {
            if n.as_f64().is_some_and(|f| f >= 0.0) {
                Some(format!("+{n}"))
            } else {
                Some(n.to_string())
            }
        }
        _ => None,
    }
}

fn strings(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::String(s) => vec![s.clone()],
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
