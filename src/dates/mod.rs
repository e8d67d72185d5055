//! Date and time resolution.
//!
//! Three grammars are tried in order for every candidate event line:
//! extended ("2022-06-07/2023"), casual ("June 7 2022 - June 10 2022",
//! "12/25/2022", "3 weeks after !launch") and historical ("586 BCE"). A
//! grammar only wins when the text after its match (an optional recurrence
//! rule) reaches the terminating colon; otherwise the next grammar gets
//! the whole line again. "0586 BCE: x" is the canonical case: the extended
//! grammar happily reads "0586" but never reaches a colon, so the line
//! falls through to the historical grammar.
//!
//! Parsed anchors resolve to absolute UTC instants in [`resolve`]; the
//! per-timezone memo tables live in [`memo`].

use chrono::{DateTime, Utc};
use text_size::{TextRange, TextSize};

pub(crate) mod cursor;
pub(crate) mod duration;
pub(crate) mod grammar;
pub(crate) mod granularity;
pub(crate) mod lexer;
pub(crate) mod memo;
pub(crate) mod recurrence;
pub(crate) mod resolve;
pub(crate) mod zone;

pub use duration::{TimeSpan, TimeUnit};
pub use granularity::DateGranularity;
pub use recurrence::Recurrence;
pub use zone::{Zone, ZoneError};

use cursor::Cursor;
use grammar::ParsedDateRange;
use lexer::TokenKind;
use memo::ZoneCache;
use recurrence::RawRecurrence;

/// A resolved absolute time range; `to` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }

    pub fn duration(&self) -> chrono::Duration {
        self.to - self.from
    }
}

/// A recognized event date expression, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EventDateMatch {
    pub(crate) parsed: ParsedDateRange,
    pub(crate) recurrence: Option<(RawRecurrence, TextRange)>,
    /// Span of the date expression within the line
    pub(crate) date_range: TextRange,
    /// Offset of the terminating colon within the line
    pub(crate) colon: TextSize,
}

/// Try the three grammars against `line`, in order. Returns `None` when no
/// grammar parse is followed by a colon, meaning the line is not an event.
pub(crate) fn recognize(
    line: &str,
    day_first: bool,
    mut tables: Option<&mut ZoneCache>,
) -> Option<EventDateMatch> {
    if !line.contains(':') {
        return None;
    }
    let tokens = lexer::tokenize(line);
    let start = tokens
        .iter()
        .find(|t| t.kind != TokenKind::Whitespace)
        .map(|t| t.offset)?;

    let mut cursor = Cursor::new(&tokens);
    if let Some(parsed) = grammar::extended::parse(&mut cursor) {
        let recurrence = recurrence::parse(
            &mut cursor,
            day_first,
            tables.as_deref_mut().map(|t| t.slash_table()),
        );
        if let Some(found) = seal(&mut cursor, parsed, recurrence, start) {
            tracing::trace!("[DATES] extended grammar matched {:?}", found.date_range);
            return Some(found);
        }
    }

    let mut cursor = Cursor::new(&tokens);
    let casual = grammar::casual::parse(
        &mut cursor,
        day_first,
        tables.as_deref_mut().map(|t| t.slash_table()),
    );
    if let Some(parsed) = casual {
        let recurrence = recurrence::parse(
            &mut cursor,
            day_first,
            tables.as_deref_mut().map(|t| t.slash_table()),
        );
        if let Some(found) = seal(&mut cursor, parsed, recurrence, start) {
            tracing::trace!("[DATES] casual grammar matched {:?}", found.date_range);
            return Some(found);
        }
    }

    let mut cursor = Cursor::new(&tokens);
    if let Some(parsed) = grammar::historical::parse(&mut cursor) {
        let recurrence = recurrence::parse(
            &mut cursor,
            day_first,
            tables.as_deref_mut().map(|t| t.slash_table()),
        );
        if let Some(found) = seal(&mut cursor, parsed, recurrence, start) {
            tracing::trace!("[DATES] historical grammar matched {:?}", found.date_range);
            return Some(found);
        }
    }
    None
}

fn seal(
    cursor: &mut Cursor<'_, '_>,
    parsed: ParsedDateRange,
    recurrence: Option<(RawRecurrence, TextRange)>,
    start: TextSize,
) -> Option<EventDateMatch> {
    cursor.skip_ws();
    if !cursor.at(TokenKind::Colon) {
        return None;
    }
    Some(EventDateMatch {
        date_range: TextRange::new(start, parsed.date_end),
        parsed,
        recurrence,
        colon: cursor.offset(),
    })
}
