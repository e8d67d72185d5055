//! Timezone resolution and wall-clock conversion.
//!
//! A document's dates are written in wall-clock time and interpreted in the
//! active zone: the header timezone, a group override, or UTC. Zones are
//! written as "UTC"/"Z", a fixed offset ("+02:00", "-5", "UTC+8"), or an
//! IANA name ("America/New_York").

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use smol_str::SmolStr;
use thiserror::Error;

/// Failure to interpret a timezone string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("unrecognized timezone `{0}`")]
    Unrecognized(SmolStr),
    #[error("timezone offset `{0}` out of range")]
    OffsetOutOfRange(SmolStr),
}

/// A resolved timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    /// A fixed offset from UTC, e.g. "+05:30"
    Fixed(FixedOffset),
    /// An IANA zone with DST rules
    Named(Tz),
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Utc
    }
}

impl Zone {
    /// Interpret a timezone string from a header or group property.
    pub fn parse(input: &str) -> Result<Zone, ZoneError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ZoneError::Unrecognized(SmolStr::default()));
        }
        if trimmed.eq_ignore_ascii_case("utc")
            || trimmed.eq_ignore_ascii_case("gmt")
            || trimmed == "Z"
        {
            return Ok(Zone::Utc);
        }
        // "UTC+5" / "GMT-03:30" style prefixes
        let offset_text = ["UTC", "utc", "GMT", "gmt"]
            .iter()
            .find_map(|p| trimmed.strip_prefix(p))
            .unwrap_or(trimmed);
        if offset_text.starts_with('+') || offset_text.starts_with('-') {
            return parse_fixed_offset(offset_text)
                .ok_or_else(|| ZoneError::OffsetOutOfRange(SmolStr::new(trimmed)))
                .map(Zone::Fixed);
        }
        trimmed
            .parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| ZoneError::Unrecognized(SmolStr::new(trimmed)))
    }

    /// Canonical key used to partition the parse cache.
    pub fn key(&self) -> SmolStr {
        match self {
            Zone::Utc => SmolStr::new_static("UTC"),
            Zone::Fixed(offset) => SmolStr::new(offset.to_string()),
            Zone::Named(tz) => SmolStr::new(tz.name()),
        }
    }

    /// Interpret a wall-clock datetime in this zone as a UTC instant.
    ///
    /// Ambiguous local times (DST fall-back) take the earlier offset; local
    /// times inside a spring-forward gap shift forward one hour.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self {
            Zone::Utc => Utc.from_utc_datetime(&local),
            Zone::Fixed(offset) => match offset.from_local_datetime(&local) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => Utc.from_utc_datetime(&local),
            },
            Zone::Named(tz) => match tz.from_local_datetime(&local) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => {
                    let shifted = local + Duration::hours(1);
                    match tz.from_local_datetime(&shifted) {
                        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                            dt.with_timezone(&Utc)
                        }
                        LocalResult::None => Utc.from_utc_datetime(&local),
                    }
                }
            },
        }
    }

    /// Wall-clock view of a UTC instant in this zone.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Zone::Utc => instant.naive_utc(),
            Zone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            Zone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }
}

/// Parse "+H", "+HH", "+HH:MM", "+HHMM" (and the `-` forms).
fn parse_fixed_offset(text: &str) -> Option<FixedOffset> {
    let (sign, digits) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let (hours, minutes): (i32, i32) = if let Some((h, m)) = digits.split_once(':') {
        (h.parse().ok()?, m.parse().ok()?)
    } else if digits.len() == 4 {
        (digits[..2].parse().ok()?, digits[2..].parse().ok()?)
    } else {
        (digits.parse().ok()?, 0)
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
