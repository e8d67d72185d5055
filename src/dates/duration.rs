//! Multi-unit durations and calendar arithmetic.
//!
//! A [`TimeSpan`] is a partial unit→count mapping such as "3 weeks 2 days".
//! Applying one to an instant walks the units in written order: calendar
//! units (years, months) shift the wall-clock date, clock units shift by an
//! exact duration, and the "weekdays" pseudo-unit skips Saturday/Sunday via
//! a closed-form week/remainder decomposition.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;

use super::zone::Zone;

/// Units usable in relative amounts and recurrence rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
    Days,
    /// Business days: Monday through Friday
    Weekdays,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Years => "years",
            Self::Months => "months",
            Self::Weeks => "weeks",
            Self::Days => "days",
            Self::Weekdays => "weekdays",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
            Self::Milliseconds => "milliseconds",
        }
    }
}

/// A partial mapping from unit to count, in written order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeSpan {
    counts: IndexMap<TimeUnit, i64>,
}

impl TimeSpan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a single-unit span
    pub fn of(unit: TimeUnit, count: i64) -> Self {
        let mut span = Self::new();
        span.add(unit, count);
        span
    }

    /// Add `count` of `unit`; repeated units accumulate
    pub fn add(&mut self, unit: TimeUnit, count: i64) {
        *self.counts.entry(unit).or_insert(0) += count;
    }

    pub fn get(&self, unit: TimeUnit) -> i64 {
        self.counts.get(&unit).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimeUnit, i64)> + '_ {
        self.counts.iter().map(|(&u, &c)| (u, c))
    }

    /// Whether any sub-day unit is present
    pub fn has_clock_units(&self) -> bool {
        [
            TimeUnit::Hours,
            TimeUnit::Minutes,
            TimeUnit::Seconds,
            TimeUnit::Milliseconds,
        ]
        .iter()
        .any(|unit| self.get(*unit) != 0)
    }

    /// Shift `instant` by this span, `sign` = ±1, interpreting calendar
    /// units in `zone`-local wall time.
    pub fn advance(&self, instant: DateTime<Utc>, zone: Zone, sign: i64) -> DateTime<Utc> {
        let mut local = zone.to_local(instant);
        for (unit, count) in self.iter() {
            local = shift(local, unit, count * sign);
        }
        zone.to_utc(local)
    }
}

fn shift(dt: NaiveDateTime, unit: TimeUnit, n: i64) -> NaiveDateTime {
    match unit {
        TimeUnit::Years => shift_months(dt, n.saturating_mul(12)),
        TimeUnit::Months => shift_months(dt, n),
        TimeUnit::Weeks => shift_days(dt, n.saturating_mul(7)),
        TimeUnit::Days => shift_days(dt, n),
        TimeUnit::Weekdays => shift_weekdays(dt, n),
        TimeUnit::Hours => dt
            .checked_add_signed(Duration::hours(n))
            .unwrap_or(dt),
        TimeUnit::Minutes => dt
            .checked_add_signed(Duration::minutes(n))
            .unwrap_or(dt),
        TimeUnit::Seconds => dt
            .checked_add_signed(Duration::seconds(n))
            .unwrap_or(dt),
        TimeUnit::Milliseconds => dt
            .checked_add_signed(Duration::milliseconds(n))
            .unwrap_or(dt),
    }
}

fn shift_months(dt: NaiveDateTime, n: i64) -> NaiveDateTime {
    let magnitude = u32::try_from(n.unsigned_abs()).unwrap_or(u32::MAX);
    let shifted = if n >= 0 {
        dt.checked_add_months(Months::new(magnitude))
    } else {
        dt.checked_sub_months(Months::new(magnitude))
    };
    shifted.unwrap_or(dt)
}

fn shift_days(dt: NaiveDateTime, n: i64) -> NaiveDateTime {
    let days = Days::new(n.unsigned_abs());
    let shifted = if n >= 0 {
        dt.checked_add_days(days)
    } else {
        dt.checked_sub_days(days)
    };
    shifted.unwrap_or(dt)
}

fn shift_date(date: NaiveDate, n: i64) -> NaiveDate {
    let days = Days::new(n.unsigned_abs());
    let shifted = if n >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    };
    shifted.unwrap_or(date)
}

/// Business-day shift, closed form.
///
/// Weekend anchors first snap to the nearest business day against the
/// direction of travel (back to Friday when adding, forward to Monday when
/// subtracting), then the count decomposes into whole weeks of 7 calendar
/// days plus a remainder measured from the anchor's position in the
/// Monday-Friday work week.
fn shift_weekdays(dt: NaiveDateTime, n: i64) -> NaiveDateTime {
    if n == 0 {
        return dt;
    }
    let date = dt.date();
    let dow = date.weekday().num_days_from_monday() as i64; // Mon=0 .. Sun=6
    let target = if n > 0 {
        let (anchor, adow) = if dow >= 5 {
            (shift_date(date, -(dow - 4)), 4)
        } else {
            (date, dow)
        };
        let total = adow + n;
        let weeks = total / 5;
        let rem = total % 5;
        shift_date(anchor, weeks * 7 + rem - adow)
    } else {
        let back = -n;
        let (anchor, adow) = if dow >= 5 {
            (shift_date(date, 7 - dow), 0)
        } else {
            (date, dow)
        };
        // Position counted from Friday, moving backwards through the week
        let bdow = 4 - adow;
        let total = bdow + back;
        let weeks = total / 5;
        let rem = total % 5;
        shift_date(anchor, -(weeks * 7 + rem - bdow))
    };
    target.and_time(dt.time())
}
