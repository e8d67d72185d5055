//! Historical-year grammar: `586 BCE`, `10000 BCE - 8000 BCE`, `500 BCE - 200`.
//!
//! Year granularity only. At least one side must carry an explicit BCE/BC
//! marker, otherwise the line is left to the other grammars. There is no year
//! zero in the written notation: `1 BCE` is astronomical year 0, `586 BCE`
//! is -585.

use chrono::{NaiveDate, NaiveDateTime};

use super::{DateAnchor, ParsedDateRange};
use crate::dates::cursor::Cursor;
use crate::dates::granularity::DateGranularity;
use crate::dates::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Era {
    Bce,
    Ce,
}

pub(crate) fn parse(cursor: &mut Cursor<'_, '_>) -> Option<ParsedDateRange> {
    cursor.skip_ws();
    let (from, from_era) = year(cursor)?;
    let mut date_end = cursor.end_of_consumed();
    let mut to = None;
    let mut explicit_bce = from_era == Some(Era::Bce);

    let mark = cursor.mark();
    cursor.skip_ws();
    if cursor.at(TokenKind::Dash) || cursor.at(TokenKind::Slash) {
        cursor.bump();
        cursor.skip_ws();
        match year(cursor) {
            Some((anchor, era)) => {
                to = Some(anchor);
                explicit_bce |= era == Some(Era::Bce);
                date_end = cursor.end_of_consumed();
            }
            None => cursor.reset(mark),
        }
    } else {
        cursor.reset(mark);
    }

    if !explicit_bce {
        return None;
    }
    Some(ParsedDateRange {
        from,
        to,
        date_end,
    })
}

/// `digits (era-word)?`; an era-less side reads as CE.
fn year(cursor: &mut Cursor<'_, '_>) -> Option<(DateAnchor, Option<Era>)> {
    let mark = cursor.mark();
    let written = cursor.number().filter(|n| *n >= 1)?;
    cursor.bump();

    let era_mark = cursor.mark();
    cursor.skip_ws();
    let era = cursor.current_word().and_then(era_from_name);
    if era.is_some() {
        cursor.bump();
    } else {
        cursor.reset(era_mark);
    }

    let astronomical = match era {
        Some(Era::Bce) => 1 - written,
        _ => written,
    };
    let Some(date) =
        i32::try_from(astronomical).ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
    else {
        cursor.reset(mark);
        return None;
    };
    let anchor = DateAnchor::Literal {
        datetime: NaiveDateTime::from(date),
        granularity: DateGranularity::Year,
    };
    Some((anchor, era))
}

fn era_from_name(word: &str) -> Option<Era> {
    if word.eq_ignore_ascii_case("bce") || word.eq_ignore_ascii_case("bc") {
        Some(Era::Bce)
    } else if word.eq_ignore_ascii_case("ce") || word.eq_ignore_ascii_case("ad") {
        Some(Era::Ce)
    } else {
        None
    }
}
