//! Extended (EDTF-like) date grammar.
//!
//! ```text
//! range    = side ("/" side)?          (slash glued, no spaces)
//! side     = "now" | "!" id amounts? | amounts | datetime
//! datetime = year ("-" MM ("-" DD)?)? time?
//! year     = "-"? digit{4,}            (signed astronomical year)
//! time     = ("T" | " ") HH ":" MM (":" SS)?
//! ```

use chrono::{NaiveDate, NaiveDateTime};

use super::{DateAnchor, ParsedDateRange, RelativeDirection, amounts, reference};
use crate::dates::cursor::Cursor;
use crate::dates::granularity::DateGranularity;
use crate::dates::lexer::TokenKind;

pub(crate) fn parse(cursor: &mut Cursor<'_, '_>) -> Option<ParsedDateRange> {
    cursor.skip_ws();
    let from = side(cursor)?;
    let mut date_end = cursor.end_of_consumed();
    let mut to = None;
    if cursor.at(TokenKind::Slash) && cursor.glued() {
        let mark = cursor.mark();
        cursor.bump();
        if cursor.glued() {
            if let Some(anchor) = side(cursor) {
                to = Some(anchor);
                date_end = cursor.end_of_consumed();
            } else {
                cursor.reset(mark);
            }
        } else {
            cursor.reset(mark);
        }
    }
    Some(ParsedDateRange {
        from,
        to,
        date_end,
    })
}

fn side(cursor: &mut Cursor<'_, '_>) -> Option<DateAnchor> {
    cursor.skip_ws();
    if cursor.eat_word("now") {
        return Some(DateAnchor::Now);
    }
    if let Some(id) = reference(cursor) {
        let span = amounts(cursor).unwrap_or_default();
        return Some(DateAnchor::Relative {
            reference: Some(id),
            amounts: span,
            direction: RelativeDirection::After,
        });
    }
    if let Some(span) = amounts(cursor) {
        return Some(DateAnchor::Relative {
            reference: None,
            amounts: span,
            direction: RelativeDirection::After,
        });
    }
    datetime(cursor).map(|(datetime, granularity)| DateAnchor::Literal {
        datetime,
        granularity,
    })
}

/// Parse a literal `year(-MM(-DD( time)?)?)?`; used by the range sides and
/// by recurrence `until` clauses.
pub(crate) fn datetime(cursor: &mut Cursor<'_, '_>) -> Option<(NaiveDateTime, DateGranularity)> {
    let mark = cursor.mark();
    cursor.skip_ws();
    let negative = cursor.at(TokenKind::Dash);
    if negative {
        cursor.bump();
        if !cursor.glued() {
            cursor.reset(mark);
            return None;
        }
    }
    if !cursor.at(TokenKind::Number) || cursor.number_width() < 4 {
        cursor.reset(mark);
        return None;
    }
    let year = match cursor.number().and_then(|n| i32::try_from(n).ok()) {
        Some(y) => {
            if negative {
                -y
            } else {
                y
            }
        }
        None => {
            cursor.reset(mark);
            return None;
        }
    };
    cursor.bump();

    let mut granularity = DateGranularity::Year;
    let mut month = 1u32;
    let mut day = 1u32;
    if cursor.at(TokenKind::Dash) && cursor.glued() {
        let month_mark = cursor.mark();
        cursor.bump();
        let month_value = if cursor.at(TokenKind::Number) && cursor.glued() && cursor.number_width() == 2
        {
            cursor.number().map(|n| n as u32)
        } else {
            None
        };
        match month_value {
            Some(m) if (1..=12).contains(&m) => {
                month = m;
                granularity = DateGranularity::Month;
                cursor.bump();
                if cursor.at(TokenKind::Dash) && cursor.glued() {
                    let day_mark = cursor.mark();
                    cursor.bump();
                    let day_value = if cursor.at(TokenKind::Number)
                        && cursor.glued()
                        && cursor.number_width() == 2
                    {
                        cursor.number().map(|n| n as u32)
                    } else {
                        None
                    };
                    match day_value {
                        Some(d) if (1..=31).contains(&d) => {
                            day = d;
                            granularity = DateGranularity::Day;
                            cursor.bump();
                        }
                        _ => cursor.reset(day_mark),
                    }
                }
            }
            _ => cursor.reset(month_mark),
        }
    }

    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        cursor.reset(mark);
        return None;
    };

    let mut hms = (0u32, 0u32, 0u32);
    if granularity == DateGranularity::Day {
        if let Some((h, m, s, time_granularity)) = time(cursor) {
            hms = (h, m, s);
            granularity = time_granularity;
        }
    }
    match date.and_hms_opt(hms.0, hms.1, hms.2) {
        Some(datetime) => Some((datetime, granularity)),
        None => {
            cursor.reset(mark);
            None
        }
    }
}

/// `("T" | whitespace) HH ":" MM (":" SS)?`, resetting the cursor when the
/// tokens after the separator do not form a time.
fn time(cursor: &mut Cursor<'_, '_>) -> Option<(u32, u32, u32, DateGranularity)> {
    let mark = cursor.mark();
    if cursor.at(TokenKind::Word)
        && cursor.glued()
        && (cursor.text() == "T" || cursor.text() == "t")
    {
        cursor.bump();
        if !cursor.glued() {
            cursor.reset(mark);
            return None;
        }
    } else if cursor.at(TokenKind::Whitespace) {
        cursor.skip_ws();
    } else {
        return None;
    }

    let hour = match cursor.number() {
        Some(h) if cursor.number_width() <= 2 && h <= 23 => h as u32,
        _ => {
            cursor.reset(mark);
            return None;
        }
    };
    cursor.bump();
    if !(cursor.at(TokenKind::Colon) && cursor.glued()) {
        cursor.reset(mark);
        return None;
    }
    cursor.bump();
    let minute = match cursor.number() {
        Some(m) if cursor.glued() && cursor.number_width() == 2 && m <= 59 => m as u32,
        _ => {
            cursor.reset(mark);
            return None;
        }
    };
    cursor.bump();

    let mut second = 0u32;
    let mut granularity = DateGranularity::Minute;
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
    Some((hour, minute, second, granularity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::lexer::tokenize;
    use rstest::rstest;

    fn parse_str(input: &str) -> Option<ParsedDateRange> {
        let tokens = tokenize(input);
        let mut cursor = Cursor::new(&tokens);
        parse(&mut cursor)
    }

    fn literal(range: &ParsedDateRange) -> (NaiveDateTime, DateGranularity) {
        match &range.from {
            DateAnchor::Literal {
                datetime,
                granularity,
            } => (*datetime, *granularity),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[rstest]
    #[case("2022", 2022, 1, 1, DateGranularity::Year)]
    #[case("2022-06", 2022, 6, 1, DateGranularity::Month)]
    #[case("2022-06-07", 2022, 6, 7, DateGranularity::Day)]
    #[case("-0585", -585, 1, 1, DateGranularity::Year)]
    fn test_date_forms(
        #[case] input: &str,
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] granularity: DateGranularity,
    ) {
        let range = parse_str(input).unwrap();
        let (datetime, g) = literal(&range);
        assert_eq!(datetime.date(), NaiveDate::from_ymd_opt(year, month, day).unwrap());
        assert_eq!(g, granularity);
    }

    #[rstest]
    #[case("2022-06-07T12:30", 12, 30, 0, DateGranularity::Minute)]
    #[case("2022-06-07 08:15:45", 8, 15, 45, DateGranularity::Second)]
    fn test_time_forms(
        #[case] input: &str,
        #[case] hour: u32,
        #[case] minute: u32,
        #[case] second: u32,
        #[case] granularity: DateGranularity,
    ) {
        let range = parse_str(input).unwrap();
        let (datetime, g) = literal(&range);
        assert_eq!(
            datetime.time(),
            chrono::NaiveTime::from_hms_opt(hour, minute, second).unwrap()
        );
        assert_eq!(g, granularity);
    }

    #[test]
    fn test_slash_range() {
        let range = parse_str("2022-06-07/2023").unwrap();
        assert!(range.to.is_some());
        assert_eq!(u32::from(range.date_end), 15);
    }

    #[test]
    fn test_slash_requires_glue() {
        let range = parse_str("2022 / 2023").unwrap();
        assert!(range.to.is_none());
        assert_eq!(u32::from(range.date_end), 4);
    }

    #[test]
    fn test_now_and_reference_sides() {
        let range = parse_str("now/!launch").unwrap();
        assert!(matches!(range.from, DateAnchor::Now));
        assert!(matches!(
            range.to,
            Some(DateAnchor::Relative {
                reference: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn test_short_years_rejected() {
        assert!(parse_str("586").is_none());
    }

    #[test]
    fn test_invalid_calendar_date_rejected() {
        assert!(parse_str("2022-02-30").is_none());
        assert!(parse_str("2022-13").is_none());
    }

    #[test]
    fn test_single_digit_month_not_extended() {
        // "2022-6" is not EDTF; the month must be two digits
        let range = parse_str("2022-6").unwrap();
        let (_, g) = literal(&range);
        assert_eq!(g, DateGranularity::Year);
        assert_eq!(u32::from(range.date_end), 4);
    }
}
