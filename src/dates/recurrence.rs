//! Recurrence rules: `every <n> <unit> [for <amount> | x<n>] [until <limit>]`.
//!
//! The rule is parsed as a suffix of an event's date expression and expanded
//! on demand into concrete instance ranges. Expansion is always bounded: the
//! rule's own `x<n>` cap, its `for`/`until` horizon, and the caller's limit
//! all apply, whichever is reached first.

use chrono::{DateTime, NaiveDateTime, Utc};
use text_size::{TextRange, TextSize};

use crate::dates::DateRange;
use crate::dates::cursor::Cursor;
use crate::dates::duration::TimeSpan;
use crate::dates::grammar::{amounts, casual, extended};
use crate::dates::granularity::DateGranularity;
use crate::dates::lexer::{TokenKind, unit_from_name};
use crate::dates::memo::SlashTable;
use crate::dates::zone::Zone;

/// A parsed but unresolved rule; the `until` limit still needs a timezone
/// and a base range to become an instant.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRecurrence {
    pub every: TimeSpan,
    pub count: Option<u64>,
    pub span: Option<TimeSpan>,
    pub until: Option<UntilAnchor>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UntilAnchor {
    Now,
    Literal {
        datetime: NaiveDateTime,
        granularity: DateGranularity,
    },
    Amounts(TimeSpan),
}

/// A resolved recurrence rule as it appears on an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    /// Step between instance starts
    pub every: TimeSpan,
    /// `x30` instance cap
    pub count: Option<u64>,
    /// `for 6 months` horizon, measured from the base start
    pub span: Option<TimeSpan>,
    /// `until 2024` horizon; instances starting at or after it are dropped
    pub til: Option<DateTime<Utc>>,
}

impl Recurrence {
    /// Expand into concrete instance ranges, the base range first.
    ///
    /// Stops at the rule's own cap or horizon, at `limit`, or when a step
    /// fails to move forward (a zero step would otherwise loop).
    pub fn expand(&self, base: DateRange, zone: Zone, limit: usize) -> Vec<DateRange> {
        let cap = match self.count {
            Some(count) => limit.min(count as usize),
            None => limit,
        };
        let horizon = self.span.as_ref().map(|span| span.advance(base.from, zone, 1));
        let mut instances = Vec::new();
        let mut current = base;
        while instances.len() < cap {
            if self.til.is_some_and(|til| current.from >= til) {
                break;
            }
            if horizon.is_some_and(|end| current.from >= end) {
                break;
            }
            instances.push(current);
            let next = DateRange {
                from: self.every.advance(current.from, zone, 1),
                to: self.every.advance(current.to, zone, 1),
            };
            if next.from <= current.from {
                break;
            }
            current = next;
        }
        instances
    }
}

/// Parse a recurrence suffix at the cursor, returning the raw rule and the
/// text range it covers. Leaves the cursor untouched when there is none.
pub(crate) fn parse(
    cursor: &mut Cursor<'_, '_>,
    day_first: bool,
    mut slash: Option<&mut SlashTable>,
) -> Option<(RawRecurrence, TextRange)> {
    let mark = cursor.mark();
    cursor.skip_ws();
    if !cursor.at_word("every") {
        cursor.reset(mark);
        return None;
    }
    let start = cursor.offset();
    cursor.bump();

    let every = match amounts(cursor) {
        Some(span) => span,
        None => {
            // bare unit: "every month"
            cursor.skip_ws();
            match cursor.current_word().and_then(unit_from_name) {
                Some(unit) => {
                    cursor.bump();
                    TimeSpan::of(unit, 1)
                }
                None => {
                    cursor.reset(mark);
                    return None;
                }
            }
        }
    };

    let mut count = None;
    let mut span = None;
    let clause_mark = cursor.mark();
    cursor.skip_ws();
    if cursor.eat_word("for") {
        match amounts(cursor) {
            Some(s) => span = Some(s),
            None => cursor.reset(clause_mark),
        }
    } else if cursor.at_word("x") {
        cursor.bump();
        match cursor.number() {
            Some(n) if cursor.glued() && n >= 1 => {
                count = Some(n as u64);
                cursor.bump();
            }
            _ => cursor.reset(clause_mark),
        }
    } else {
        cursor.reset(clause_mark);
    }

    let mut until = None;
    let until_mark = cursor.mark();
    cursor.skip_ws();
    if cursor.at_word("until") || cursor.at_word("til") {
        cursor.bump();
        match limit(cursor, day_first, slash.as_deref_mut()) {
            Some(anchor) => until = Some(anchor),
            None => cursor.reset(until_mark),
        }
    } else {
        cursor.reset(until_mark);
    }

    let range = TextRange::new(start, cursor.end_of_consumed());
    Some((
        RawRecurrence {
            every,
            count,
            span,
            until,
        },
        range,
    ))
}

fn limit(
    cursor: &mut Cursor<'_, '_>,
    day_first: bool,
    slash: Option<&mut SlashTable>,
) -> Option<UntilAnchor> {
    cursor.skip_ws();
    if cursor.eat_word("now") {
        return Some(UntilAnchor::Now);
    }
    if let Some((datetime, granularity)) = extended::datetime(cursor) {
        return Some(UntilAnchor::Literal {
            datetime,
            granularity,
        });
    }
    if let Some((datetime, granularity)) = casual::date(cursor, day_first, slash) {
        return Some(UntilAnchor::Literal {
            datetime,
            granularity,
        });
    }
    amounts(cursor).map(UntilAnchor::Amounts)
}
