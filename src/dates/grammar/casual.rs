//! Casual date grammar: month names, slash dates, 12-hour clock times and
//! "3 weeks after !launch" relative phrases.
//!
//! ```text
//! range    = side ((" - " | " to ") side)?
//! side     = "now" | relative | date time?
//! relative = amounts ("after" | "before" | "by")? ref?
//! date     = weekday? (month day? year | day month year | slash | year)
//! slash    = n "/" n "/" n | M "/" YYYY        (order set by day_first)
//! time     = H (":" MM (":" SS)?)? meridiem? | HH ":" MM
//! ```
//!
//! Slash dates are ambiguous ("5/9/2009"), so their component order comes
//! from the header's `dateFormat` and their resolution is memoized in the
//! per-zone [`SlashTable`].

use chrono::{NaiveDate, NaiveDateTime};
use smol_str::SmolStr;

use super::{DateAnchor, ParsedDateRange, RelativeDirection, amounts, reference};
use crate::dates::cursor::Cursor;
use crate::dates::granularity::DateGranularity;
use crate::dates::lexer::{TokenKind, is_weekday_name, meridiem_from_name, month_from_name};
use crate::dates::memo::SlashTable;

pub(crate) fn parse(
    cursor: &mut Cursor<'_, '_>,
    day_first: bool,
    mut slash: Option<&mut SlashTable>,
) -> Option<ParsedDateRange> {
    cursor.skip_ws();
    let from = side(cursor, day_first, slash.as_deref_mut())?;
    let mut date_end = cursor.end_of_consumed();
    let mut to = None;
    let mark = cursor.mark();
    cursor.skip_ws();
    if cursor.at(TokenKind::Dash) || cursor.at_word("to") {
        cursor.bump();
        match side(cursor, day_first, slash.as_deref_mut()) {
            Some(anchor) => {
                to = Some(anchor);
                date_end = cursor.end_of_consumed();
            }
            None => cursor.reset(mark),
        }
    } else {
        cursor.reset(mark);
    }
    Some(ParsedDateRange {
        from,
        to,
        date_end,
    })
}

fn side(
    cursor: &mut Cursor<'_, '_>,
    day_first: bool,
    slash: Option<&mut SlashTable>,
) -> Option<DateAnchor> {
    cursor.skip_ws();
    if cursor.eat_word("now") {
        return Some(DateAnchor::Now);
    }
    if let Some(anchor) = relative(cursor) {
        return Some(anchor);
    }
    date(cursor, day_first, slash).map(|(datetime, granularity)| DateAnchor::Literal {
        datetime,
        granularity,
    })
}

/// `amounts ("after" | "before" | "by")? ref?`, as in "3 weeks 2 days before
/// !launch". Without a direction word the amounts run forward from the
/// reference; without a reference they anchor on the prior event.
fn relative(cursor: &mut Cursor<'_, '_>) -> Option<DateAnchor> {
    let span = amounts(cursor)?;
    let mut direction = RelativeDirection::After;
    let direction_mark = cursor.mark();
    cursor.skip_ws();
    if cursor.eat_word("after") {
        // the default
    } else if cursor.eat_word("before") || cursor.eat_word("by") {
        direction = RelativeDirection::Before;
    } else {
        cursor.reset(direction_mark);
    }
    let reference_mark = cursor.mark();
    cursor.skip_ws();
    let target = match reference(cursor) {
        Some(id) => Some(id),
        None => {
            cursor.reset(reference_mark);
            None
        }
    };
    Some(DateAnchor::Relative {
        reference: target,
        amounts: span,
        direction,
    })
}

pub(crate) fn date(
    cursor: &mut Cursor<'_, '_>,
    day_first: bool,
    slash: Option<&mut SlashTable>,
) -> Option<(NaiveDateTime, DateGranularity)> {
    let mark = cursor.mark();
    // decorative weekday prefix ("Saturday, June 7 2022"); never validated
    // against the date it precedes
    if cursor.current_word().is_some_and(is_weekday_name) {
        cursor.bump();
        cursor.eat(TokenKind::Comma);
        cursor.skip_ws();
    }
    let parsed = month_name_first(cursor)
        .or_else(|| day_then_month(cursor))
        .or_else(|| slash_or_year(cursor, day_first, slash));
    let Some((base, mut granularity)) = parsed else {
        cursor.reset(mark);
        return None;
    };
    let mut hms = (0u32, 0u32, 0u32);
    if granularity == DateGranularity::Day {
        if let Some((h, m, s, time_granularity)) = clock(cursor) {
            hms = (h, m, s);
            granularity = time_granularity;
        }
    }
    match base.and_hms_opt(hms.0, hms.1, hms.2) {
        Some(datetime) => Some((datetime, granularity)),
        None => {
            cursor.reset(mark);
            None
        }
    }
}

/// `June 7, 2022` / `June 2022`
fn month_name_first(cursor: &mut Cursor<'_, '_>) -> Option<(NaiveDate, DateGranularity)> {
    let mark = cursor.mark();
    let month = cursor.current_word().and_then(month_from_name)?;
    cursor.bump();
    cursor.skip_ws();
    let mut day = None;
    if let Some(n) = cursor.number() {
        if cursor.number_width() <= 2 && (1..=31).contains(&n) {
            day = Some(n as u32);
            cursor.bump();
            cursor.eat(TokenKind::Comma);
            cursor.skip_ws();
        }
    }
    let Some(year) = year_number(cursor) else {
        cursor.reset(mark);
        return None;
    };
    let date = match day {
        Some(d) => NaiveDate::from_ymd_opt(year, month, d).map(|d| (d, DateGranularity::Day)),
        None => NaiveDate::from_ymd_opt(year, month, 1).map(|d| (d, DateGranularity::Month)),
    };
    if date.is_none() {
        cursor.reset(mark);
    }
    date
}

/// `7 June 2022`
fn day_then_month(cursor: &mut Cursor<'_, '_>) -> Option<(NaiveDate, DateGranularity)> {
    let mark = cursor.mark();
    let day = cursor.number().filter(|n| (1..=31).contains(n))?;
    if cursor.number_width() > 2 {
        return None;
    }
    cursor.bump();
    cursor.skip_ws();
    let Some(month) = cursor.current_word().and_then(month_from_name) else {
        cursor.reset(mark);
        return None;
    };
    cursor.bump();
    cursor.skip_ws();
    let Some(year) = year_number(cursor) else {
        cursor.reset(mark);
        return None;
    };
    match NaiveDate::from_ymd_opt(year, month, day as u32) {
        Some(date) => Some((date, DateGranularity::Day)),
        None => {
            cursor.reset(mark);
            None
        }
    }
}

/// A 4+ digit year number ("2022"); bumps past it on success.
fn year_number(cursor: &mut Cursor<'_, '_>) -> Option<i32> {
    if cursor.number_width() < 4 {
        return None;
    }
    let year = cursor.number().and_then(|n| i32::try_from(n).ok())?;
    cursor.bump();
    Some(year)
}

/// `12/25/2022` (or `25/12/2022` day-first), `2022/12/25`, `6/2022`, `2022`
fn slash_or_year(
    cursor: &mut Cursor<'_, '_>,
    day_first: bool,
    memo: Option<&mut SlashTable>,
) -> Option<(NaiveDate, DateGranularity)> {
    let mark = cursor.mark();
    let first = cursor.number()?;
    let first_text = cursor.text();
    let first_width = cursor.number_width();
    cursor.bump();
    if !(cursor.at(TokenKind::Slash) && cursor.glued()) {
        // bare year
        if first_width >= 4 {
            if let Some(date) =
                i32::try_from(first).ok().and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            {
                return Some((date, DateGranularity::Year));
            }
        }
        cursor.reset(mark);
        return None;
    }
    cursor.bump();
    if !(cursor.at(TokenKind::Number) && cursor.glued()) {
        cursor.reset(mark);
        return None;
    }
    let second = cursor.number()?;
    let second_text = cursor.text();
    let second_width = cursor.number_width();
    cursor.bump();

    if !(cursor.at(TokenKind::Slash) && cursor.glued()) {
        // M/YYYY
        if second_width >= 3 && (1..=12).contains(&first) {
            if let Some(date) = i32::try_from(second)
                .ok()
                .and_then(|y| NaiveDate::from_ymd_opt(y, first as u32, 1))
            {
                return Some((date, DateGranularity::Month));
            }
        }
        cursor.reset(mark);
        return None;
    }
    cursor.bump();
    if !(cursor.at(TokenKind::Number) && cursor.glued()) {
        cursor.reset(mark);
        return None;
    }
    let third = cursor.number()?;
    let third_text = cursor.text();
    let third_width = cursor.number_width();
    cursor.bump();

    let date = match memo {
        Some(table) => {
            let key = (
                SmolStr::new(format!("{first_text}/{second_text}/{third_text}")),
                day_first,
            );
            match table.get(&key) {
                Some(cached) => *cached,
                None => {
                    let computed =
                        slash_components(first, first_width, second, third, third_width, day_first);
                    table.insert(key, computed);
                    computed
                }
            }
        }
        None => slash_components(first, first_width, second, third, third_width, day_first),
    };
    match date {
        Some(date) => Some((date, DateGranularity::Day)),
        None => {
            cursor.reset(mark);
            None
        }
    }
}

fn slash_components(
    first: i64,
    first_width: usize,
    second: i64,
    third: i64,
    third_width: usize,
    day_first: bool,
) -> Option<NaiveDate> {
    let (year, month, day) = if first_width >= 3 {
        (first, second, third)
    } else {
        let year = if third_width <= 2 { 2000 + third } else { third };
        if day_first {
            (year, second, first)
        } else {
            (year, first, second)
        }
    };
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

/// `8am`, `8:30pm`, `18:30`, `09:15:30` following a day-granularity date.
/// A bare trailing number is not a time; 24-hour form needs explicit minutes.
fn clock(cursor: &mut Cursor<'_, '_>) -> Option<(u32, u32, u32, DateGranularity)> {
    let mark = cursor.mark();
    if !cursor.at(TokenKind::Whitespace) {
        return None;
    }
    cursor.skip_ws();
    let hour_raw = match cursor.number() {
        Some(h) if cursor.number_width() <= 2 => h as u32,
        _ => {
            cursor.reset(mark);
            return None;
        }
    };
    cursor.bump();

    let mut minute = 0u32;
    let mut second = 0u32;
    let mut granularity = DateGranularity::Hour;
    if cursor.at(TokenKind::Colon) && cursor.glued() {
        cursor.bump();
        match cursor.number() {
            Some(m) if cursor.glued() && cursor.number_width() == 2 && m <= 59 => {
                minute = m as u32;
                granularity = DateGranularity::Minute;
                cursor.bump();
            }
            _ => {
                cursor.reset(mark);
                return None;
            }
        }
        if cursor.at(TokenKind::Colon) && cursor.glued() {
            let second_mark = cursor.mark();
            cursor.bump();
            match cursor.number() {
                Some(s) if cursor.glued() && cursor.number_width() == 2 && s <= 59 => {
                    second = s as u32;
                    granularity = DateGranularity::Second;
                    cursor.bump();
                }
                _ => cursor.reset(second_mark),
            }
        }
    }

    let meridiem = if cursor.glued() {
        cursor.current_word().and_then(meridiem_from_name)
    } else {
        None
    };
    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour_raw) {
                cursor.reset(mark);
                return None;
            }
            cursor.bump();
            hour_raw % 12 + if pm { 12 } else { 0 }
        }
        None => {
            if granularity == DateGranularity::Hour || hour_raw > 23 {
                cursor.reset(mark);
                return None;
            }
            hour_raw
        }
    };
    Some((hour, minute, second, granularity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::lexer::tokenize;
    use rstest::rstest;

    fn parse_str(input: &str, day_first: bool) -> Option<ParsedDateRange> {
        let tokens = tokenize(input);
        let mut cursor = Cursor::new(&tokens);
        parse(&mut cursor, day_first, None)
    }

    fn literal(anchor: &DateAnchor) -> (NaiveDateTime, DateGranularity) {
        match anchor {
            DateAnchor::Literal {
                datetime,
                granularity,
            } => (*datetime, *granularity),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[rstest]
    #[case("June 7 2022", day(2022, 6, 7), DateGranularity::Day)]
    #[case("June 7, 2022", day(2022, 6, 7), DateGranularity::Day)]
    #[case("jun 7 2022", day(2022, 6, 7), DateGranularity::Day)]
    #[case("7 June 2022", day(2022, 6, 7), DateGranularity::Day)]
    #[case("June 2022", day(2022, 6, 1), DateGranularity::Month)]
    #[case("Saturday, June 4 2022", day(2022, 6, 4), DateGranularity::Day)]
    #[case("6/2022", day(2022, 6, 1), DateGranularity::Month)]
    #[case("2022/06/07", day(2022, 6, 7), DateGranularity::Day)]
    fn test_casual_dates(
        #[case] input: &str,
        #[case] expected: NaiveDateTime,
        #[case] granularity: DateGranularity,
    ) {
        let range = parse_str(input, false).unwrap();
        let (datetime, g) = literal(&range.from);
        assert_eq!(datetime, expected);
        assert_eq!(g, granularity);
    }

    #[rstest]
    #[case(false, day(2009, 5, 9))]
    #[case(true, day(2009, 9, 5))]
    fn test_slash_order_follows_day_first(#[case] day_first: bool, #[case] expected: NaiveDateTime) {
        let range = parse_str("5/9/2009", day_first).unwrap();
        let (datetime, _) = literal(&range.from);
        assert_eq!(datetime, expected);
    }

    #[test]
    fn test_two_digit_slash_year() {
        let range = parse_str("12/25/22", false).unwrap();
        let (datetime, _) = literal(&range.from);
        assert_eq!(datetime, day(2022, 12, 25));
    }

    #[rstest]
    #[case("June 7 2022 8am", 8, 0, 0, DateGranularity::Hour)]
    #[case("June 7 2022 12am", 0, 0, 0, DateGranularity::Hour)]
    #[case("June 7 2022 8:30pm", 20, 30, 0, DateGranularity::Minute)]
    #[case("June 7 2022 18:30", 18, 30, 0, DateGranularity::Minute)]
    #[case("June 7 2022 09:15:30", 9, 15, 30, DateGranularity::Second)]
    fn test_clock_forms(
        #[case] input: &str,
        #[case] hour: u32,
        #[case] minute: u32,
        #[case] second: u32,
        #[case] granularity: DateGranularity,
    ) {
        let range = parse_str(input, false).unwrap();
        let (datetime, g) = literal(&range.from);
        assert_eq!(
            datetime.time(),
            chrono::NaiveTime::from_hms_opt(hour, minute, second).unwrap()
        );
        assert_eq!(g, granularity);
    }

    #[test]
    fn test_bare_trailing_number_is_not_a_time() {
        let range = parse_str("June 7 2022 8", false).unwrap();
        let (datetime, g) = literal(&range.from);
        assert_eq!(datetime, day(2022, 6, 7));
        assert_eq!(g, DateGranularity::Day);
        assert_eq!(u32::from(range.date_end), 11);
    }

    #[rstest]
    #[case("June 7 2022 - June 10 2022")]
    #[case("June 7 2022 to June 10 2022")]
    fn test_ranges(#[case] input: &str) {
        let range = parse_str(input, false).unwrap();
        let (from, _) = literal(&range.from);
        let (to, _) = literal(range.to.as_ref().unwrap());
        assert_eq!(from, day(2022, 6, 7));
        assert_eq!(to, day(2022, 6, 10));
    }

    #[test]
    fn test_relative_with_direction_and_reference() {
        let range = parse_str("3 weeks before !launch", false).unwrap();
        match &range.from {
            DateAnchor::Relative {
                reference,
                amounts,
                direction,
            } => {
                assert_eq!(reference.as_deref(), Some("launch"));
                assert_eq!(amounts.get(crate::dates::TimeUnit::Weeks), 3);
                assert_eq!(*direction, RelativeDirection::Before);
            }
            other => panic!("expected relative, got {other:?}"),
        }
        assert!(range.is_relative());
    }

    #[test]
    fn test_relative_without_reference() {
        let range = parse_str("10 work days after", false).unwrap();
        match &range.from {
            DateAnchor::Relative {
                reference,
                amounts,
                direction,
            } => {
                assert!(reference.is_none());
                assert_eq!(amounts.get(crate::dates::TimeUnit::Weekdays), 10);
                assert_eq!(*direction, RelativeDirection::After);
            }
            other => panic!("expected relative, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_dates_rejected() {
        assert!(parse_str("June 31 2022", false).is_none());
        assert!(parse_str("13/32/2022", false).is_none());
        assert!(parse_str("June 7", false).is_none());
    }

    #[test]
    fn test_slash_memo_records_both_orders() {
        let mut table = SlashTable::default();
        let tokens = tokenize("5/9/2009");
        let mut cursor = Cursor::new(&tokens);
        parse(&mut cursor, false, Some(&mut table)).unwrap();
        let mut cursor = Cursor::new(&tokens);
        parse(&mut cursor, true, Some(&mut table)).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table[&(SmolStr::new("5/9/2009"), false)],
            NaiveDate::from_ymd_opt(2009, 5, 9)
        );
        assert_eq!(
            table[&(SmolStr::new("5/9/2009"), true)],
            NaiveDate::from_ymd_opt(2009, 9, 5)
        );
    }
}
