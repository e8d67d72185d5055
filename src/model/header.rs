//! The parsed document header.
//!
//! Everything before the first structural or event line is header territory:
//! a `---`-fenced YAML front matter block, or a bare run of `key: value`
//! lines. The core extracts the handful of keys it interprets and keeps the
//! whole decoded mapping raw for collaborators.

use indexmap::IndexMap;
use smol_str::SmolStr;
use text_size::TextRange;

/// Component order for ambiguous slash dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DateFormat {
    /// `5/9/2009` reads May 9
    #[default]
    MonthFirst,
    /// `5/9/2009` reads September 5
    DayFirst,
}

impl DateFormat {
    /// `dateFormat: d/M/y` (anything starting with a `d`) selects day-first
    pub fn from_value(value: &str) -> Self {
        if value.trim_start().starts_with(['d', 'D']) {
            Self::DayFirst
        } else {
            Self::MonthFirst
        }
    }

    pub fn day_first(&self) -> bool {
        matches!(self, Self::DayFirst)
    }
}

/// The raw parsed header object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    pub title: Option<String>,
    pub description: Option<String>,
    /// The timezone value exactly as written, resolved separately
    pub timezone: Option<String>,
    pub date_format: DateFormat,
    /// `view:` list, paths this document is visible to
    pub view: Vec<String>,
    /// `edit:` list, paths allowed to edit
    pub edit: Vec<String>,
    /// `#name: value` tag definitions, in definition order
    pub tags: IndexMap<SmolStr, String>,
    /// The full decoded mapping, untouched
    pub raw: serde_yaml::Mapping,
    /// Source span of the header block, fences included
    pub range: Option<TextRange>,
}

impl Header {
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.tags.is_empty() && self.range.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("d/M/y", DateFormat::DayFirst)]
    #[case("dd/MM/yyyy", DateFormat::DayFirst)]
    #[case("M/d/y", DateFormat::MonthFirst)]
    #[case("", DateFormat::MonthFirst)]
    fn test_date_format(#[case] value: &str, #[case] expected: DateFormat) {
        assert_eq!(DateFormat::from_value(value), expected);
        assert_eq!(expected.day_first(), expected == DateFormat::DayFirst);
    }

    #[test]
    fn test_empty() {
        assert!(Header::default().is_empty());
    }
}
