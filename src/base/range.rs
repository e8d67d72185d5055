//! Classified source ranges.
//!
//! Every syntactic element the parser recognizes is reported as a [`Range`]
//! so editors can highlight and decorate without re-tokenizing the document.

use text_size::TextRange;

/// Syntactic category of a recognized source range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeType {
    /// `// …` comment line
    Comment,
    /// `#name: value` tag definition line
    TagDefinition,
    /// `#name` occurrence in event text
    Tag,
    /// Date-range portion of an event line
    DateRange,
    /// Recurrence clause (`every …`) of an event line
    Recurrence,
    /// The `:` separating the date part from the event text
    DateRangeColon,
    /// A `group`/`section` keyword line or markdown heading
    Section,
    /// An `endGroup`/`endSection` line
    SectionEnd,
    /// A `key: value` property line
    Property,
    /// A `- [ ]` / `- [x]` checklist item
    Checkbox,
    /// A `- item` list entry
    ListItem,
    /// An inline `![alt](url)` image
    Image,
    /// An inline `[text](url)` link
    Link,
    /// A `---` header fence line
    HeaderFence,
    /// An `!id` event identifier
    EventId,
    /// A completion percentage such as `40%`
    Percent,
}

impl RangeType {
    /// String form used by editor-facing consumers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::TagDefinition => "tagDefinition",
            Self::Tag => "tag",
            Self::DateRange => "dateRange",
            Self::Recurrence => "recurrence",
            Self::DateRangeColon => "dateRangeColon",
            Self::Section => "section",
            Self::SectionEnd => "sectionEnd",
            Self::Property => "property",
            Self::Checkbox => "checkbox",
            Self::ListItem => "listItem",
            Self::Image => "image",
            Self::Link => "link",
            Self::HeaderFence => "headerFence",
            Self::EventId => "eventId",
            Self::Percent => "percent",
        }
    }
}

impl std::fmt::Display for RangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified range in the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Syntactic category
    pub kind: RangeType,
    /// Byte span in the source text
    pub range: TextRange,
}

impl Range {
    pub fn new(kind: RangeType, range: TextRange) -> Self {
        Self { kind, range }
    }

    /// Check whether `offset` falls inside this range
    pub fn contains(&self, offset: text_size::TextSize) -> bool {
        self.range.contains(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    #[test]
    fn test_range_contains() {
        let r = Range::new(
            RangeType::Comment,
            TextRange::new(TextSize::new(4), TextSize::new(10)),
        );
        assert!(r.contains(TextSize::new(4)));
        assert!(r.contains(TextSize::new(9)));
        assert!(!r.contains(TextSize::new(10)));
    }

    #[test]
    fn test_range_type_as_str() {
        assert_eq!(RangeType::DateRange.as_str(), "dateRange");
        assert_eq!(RangeType::Checkbox.as_str(), "checkbox");
        assert_eq!(RangeType::HeaderFence.to_string(), "headerFence");
    }
}
