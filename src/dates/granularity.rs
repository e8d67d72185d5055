//! Date granularity: the coarsest unit actually written in a date literal.
//!
//! Granularity drives the default width of start-only ranges ("2022-06"
//! covers all of June) and is part of the rounded-date cache key.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// The deepest component present in a date literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateGranularity {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// A point in time with no written components ("now", relative results)
    Instant,
}

impl DateGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Instant => "instant",
        }
    }

    /// Round `start` one unit up at this granularity.
    ///
    /// Year, month and day literals denote a whole calendar unit, so their
    /// implied end is the start of the next unit. Finer granularities denote
    /// a point and round to themselves (zero-width range).
    pub fn round_up(&self, start: NaiveDateTime) -> NaiveDateTime {
        let date = start.date();
        let next = match self {
            Self::Year => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1),
            Self::Month => {
                if date.month() == 12 {
                    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
                }
            }
            Self::Day => date.succ_opt(),
            Self::Hour | Self::Minute | Self::Second | Self::Instant => return start,
        };
        next.and_then(|d| d.and_hms_opt(0, 0, 0)).unwrap_or(start)
    }
}

impl std::fmt::Display for DateGranularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
