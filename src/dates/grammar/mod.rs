//! Date-range grammars.
//!
//! Three alternative grammars are tried in order on an event-line prefix:
//!
//! 1. [`extended`] - EDTF-like notation (`2022-06-07T12:30/2023`, `now`,
//!    `!id 3 days`)
//! 2. [`casual`] - human phrasing ("June 4 1999 - 8/1/1999", "3 work days
//!    after !launch")
//! 3. [`historical`] - BCE/BC year ranges ("2500 BCE - 1000 BCE")
//!
//! Each grammar produces unresolved [`DateAnchor`]s; conversion to UTC
//! instants (zone application, rounding, reference lookup) happens in
//! [`crate::dates::resolve`].

pub(crate) mod casual;
pub(crate) mod extended;
pub(crate) mod historical;

use chrono::NaiveDateTime;
use smol_str::SmolStr;
use text_size::TextSize;

use super::cursor::Cursor;
use super::duration::TimeSpan;
use super::granularity::DateGranularity;
use super::lexer::{TokenKind, unit_from_name};

/// Direction of a relative expression: "after" advances from the reference's
/// end, "before"/"by" counts back from the reference's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum RelativeDirection {
    #[default]
    After,
    Before,
}

/// One side of a date range before resolution
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DateAnchor {
    /// Literal wall-clock datetime with the granularity it was written at
    Literal {
        datetime: NaiveDateTime,
        granularity: DateGranularity,
    },
    /// The wall clock at parse time
    Now,
    /// Offset from a referenced (`!id`) or prior event
    Relative {
        reference: Option<SmolStr>,
        amounts: TimeSpan,
        direction: RelativeDirection,
    },
}

impl DateAnchor {
    pub fn is_relative(&self) -> bool {
        matches!(self, Self::Relative { .. })
    }

    pub fn is_now(&self) -> bool {
        matches!(self, Self::Now)
    }
}

/// A recognized, still-unresolved date-range expression
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedDateRange {
    pub from: DateAnchor,
    pub to: Option<DateAnchor>,
    /// End offset of the matched date text (before recurrence and colon)
    pub date_end: TextSize,
}

impl ParsedDateRange {
    pub fn is_relative(&self) -> bool {
        self.from.is_relative() || self.to.as_ref().is_some_and(|t| t.is_relative())
    }

    /// Whether any side depends on the wall clock or document position
    pub fn is_clock_dependent(&self) -> bool {
        self.is_relative()
            || self.from.is_now()
            || self.to.as_ref().is_some_and(|t| t.is_now())
    }
}

/// Parse a `<number> <unit>` sequence ("3 weeks 2 days", "10 work days").
///
/// Leaves the cursor after the last matched pair; returns `None` without
/// moving it when the first pair does not match.
pub(crate) fn amounts(cursor: &mut Cursor<'_, '_>) -> Option<TimeSpan> {
    let start = cursor.mark();
    let mut span = TimeSpan::new();
    loop {
        let mark = cursor.mark();
        cursor.skip_ws();
        let Some(n) = cursor.number() else {
            cursor.reset(mark);
            break;
        };
        cursor.bump();
        cursor.skip_ws();
        let unit = if cursor.at_word("work") || cursor.at_word("business") {
            cursor.bump();
            cursor.skip_ws();
            if cursor.at_word("day") || cursor.at_word("days") {
                cursor.bump();
                super::duration::TimeUnit::Weekdays
            } else {
                cursor.reset(mark);
                break;
            }
        } else if let Some(unit) = cursor.current_word().and_then(unit_from_name) {
            cursor.bump();
            unit
        } else {
            cursor.reset(mark);
            break;
        };
        span.add(unit, n);
    }
    if span.is_empty() {
        cursor.reset(start);
        None
    } else {
        Some(span)
    }
}

/// Parse an `!id` reference. The id runs over word/number/dash tokens glued
/// to the bang; returns `None` without moving the cursor when absent.
pub(crate) fn reference(cursor: &mut Cursor<'_, '_>) -> Option<SmolStr> {
    let mark = cursor.mark();
    if !cursor.eat(TokenKind::Bang) {
        return None;
    }
    let mut id = String::new();
    while cursor.glued()
        && matches!(
            cursor.kind(),
            Some(TokenKind::Word | TokenKind::Number | TokenKind::Dash)
        )
    {
        id.push_str(cursor.text());
        cursor.bump();
    }
    if id.is_empty() {
        cursor.reset(mark);
        return None;
    }
    Some(SmolStr::new(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::duration::TimeUnit;
    use crate::dates::lexer::tokenize;

    #[test]
    fn test_amounts_multi_unit() {
        let tokens = tokenize("3 weeks 2 days later");
        let mut cursor = Cursor::new(&tokens);
        let span = amounts(&mut cursor).unwrap();
        assert_eq!(span.get(TimeUnit::Weeks), 3);
        assert_eq!(span.get(TimeUnit::Days), 2);
        assert!(cursor.at(TokenKind::Whitespace) || cursor.at_word("later"));
    }

    #[test]
    fn test_amounts_work_days() {
        let tokens = tokenize("10 work days");
        let mut cursor = Cursor::new(&tokens);
        let span = amounts(&mut cursor).unwrap();
        assert_eq!(span.get(TimeUnit::Weekdays), 10);
    }

    #[test]
    fn test_amounts_rejects_bare_number() {
        let tokens = tokenize("4 June 1999");
        let mut cursor = Cursor::new(&tokens);
        assert!(amounts(&mut cursor).is_none());
        assert_eq!(cursor.number(), Some(4));
    }

    #[test]
    fn test_reference_with_dashes() {
        let tokens = tokenize("!launch-day rest");
        let mut cursor = Cursor::new(&tokens);
        assert_eq!(reference(&mut cursor).as_deref(), Some("launch-day"));
    }

    #[test]
    fn test_reference_requires_glued_id() {
        let tokens = tokenize("! launch");
        let mut cursor = Cursor::new(&tokens);
        assert!(reference(&mut cursor).is_none());
        assert!(cursor.at(TokenKind::Bang));
    }
}
