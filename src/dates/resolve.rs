//! Turns parsed date anchors into absolute UTC instants.
//!
//! Literal anchors are converted through the active timezone; a start-only
//! range widens one unit up at its granularity ("2022-06" covers all of
//! June). Relative anchors resolve against a referenced event's range or
//! the prior event, falling back to "now" when the reference is missing.
//! Literal-only matches are memoized per timezone keyed by their exact
//! source text; anything touching "now" or a reference is recomputed every
//! parse.

use chrono::{DateTime, NaiveDateTime, Utc};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::dates::DateRange;
use crate::dates::duration::{TimeSpan, TimeUnit};
use crate::dates::grammar::{DateAnchor, ParsedDateRange, RelativeDirection};
use crate::dates::granularity::DateGranularity;
use crate::dates::memo::{CachedRange, ZoneCache};
use crate::dates::recurrence::{RawRecurrence, Recurrence, UntilAnchor};
use crate::dates::zone::Zone;

/// Everything a single resolution needs from the surrounding parse.
pub(crate) struct ResolveEnv<'a> {
    pub zone: Zone,
    /// Slash-date component order, part of the memo key
    pub day_first: bool,
    pub now: DateTime<Utc>,
    /// Range of the most recently pushed event, the implicit anchor
    pub prior: Option<DateRange>,
    /// Ranges of events carrying an `!id`
    pub ids: &'a FxHashMap<SmolStr, DateRange>,
    pub tables: Option<&'a mut ZoneCache>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedRange {
    pub range: DateRange,
    pub granularity: DateGranularity,
    pub is_relative: bool,
    pub issues: Vec<ResolveIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResolveIssue {
    /// `!id` names an event that does not exist (yet)
    MissingReference(SmolStr),
    /// A relative expression with nothing before it to anchor on
    NoPriorEvent,
}

pub(crate) fn resolve(
    parsed: &ParsedDateRange,
    literal: &str,
    env: &mut ResolveEnv<'_>,
) -> ResolvedRange {
    let cacheable = !parsed.is_clock_dependent();
    if cacheable {
        if let Some(tables) = env.tables.as_deref_mut() {
            if let Some(hit) = tables.range(literal, env.day_first) {
                return ResolvedRange {
                    range: hit.range,
                    granularity: hit.granularity,
                    is_relative: false,
                    issues: Vec::new(),
                };
            }
        }
    }

    let mut issues = Vec::new();
    let zone = env.zone;
    let (range, granularity) = match (&parsed.from, &parsed.to) {
        (
            DateAnchor::Literal {
                datetime,
                granularity,
            },
            None,
        ) => {
            let range = DateRange {
                from: zone.to_utc(*datetime),
                to: zone.to_utc(round(&mut env.tables, *granularity, *datetime)),
            };
            (range, *granularity)
        }
        (DateAnchor::Now, None) => (
            DateRange {
                from: env.now,
                to: env.now,
            },
            DateGranularity::Instant,
        ),
        (
            DateAnchor::Relative {
                reference,
                amounts,
                direction,
            },
            None,
        ) => {
            // the reference point becomes one endpoint and the amount the
            // duration
            let anchor = anchor_range(reference.as_ref(), env, &mut issues);
            let range = match direction {
                RelativeDirection::After => {
                    let from = anchor.to;
                    DateRange {
                        from,
                        to: landing_bound(amounts, amounts.advance(from, zone, 1), zone),
                    }
                }
                RelativeDirection::Before => {
                    let to = anchor.from;
                    DateRange {
                        from: amounts.advance(to, zone, -1),
                        to,
                    }
                }
            };
            (range, DateGranularity::Instant)
        }
        (from_anchor, Some(to_anchor)) => {
            let (from, from_granularity) = start_instant(from_anchor, env, &mut issues);
            let to = end_instant(to_anchor, from, env, &mut issues);
            (DateRange { from, to }, from_granularity)
        }
    };

    if cacheable {
        if let Some(tables) = env.tables.as_deref_mut() {
            tables.insert_range(literal, env.day_first, CachedRange { range, granularity });
        }
    }
    ResolvedRange {
        range,
        granularity,
        is_relative: parsed.is_relative(),
        issues,
    }
}

/// Resolve a raw recurrence rule against the event's own range.
pub(crate) fn resolve_recurrence(
    raw: &RawRecurrence,
    base: DateRange,
    zone: Zone,
    now: DateTime<Utc>,
) -> Recurrence {
    let til = raw.until.as_ref().map(|anchor| match anchor {
        UntilAnchor::Now => now,
        UntilAnchor::Literal { datetime, .. } => zone.to_utc(*datetime),
        UntilAnchor::Amounts(span) => span.advance(base.from, zone, 1),
    });
    Recurrence {
        every: raw.every.clone(),
        count: raw.count,
        span: raw.span.clone(),
        til,
    }
}

fn start_instant(
    anchor: &DateAnchor,
    env: &mut ResolveEnv<'_>,
    issues: &mut Vec<ResolveIssue>,
) -> (DateTime<Utc>, DateGranularity) {
    match anchor {
        DateAnchor::Literal {
            datetime,
            granularity,
        } => (env.zone.to_utc(*datetime), *granularity),
        DateAnchor::Now => (env.now, DateGranularity::Instant),
        DateAnchor::Relative {
            reference,
            amounts,
            direction,
        } => {
            let anchor = anchor_range(reference.as_ref(), env, issues);
            let instant = match direction {
                RelativeDirection::After => amounts.advance(anchor.to, env.zone, 1),
                RelativeDirection::Before => amounts.advance(anchor.from, env.zone, -1),
            };
            (instant, DateGranularity::Instant)
        }
    }
}

/// The end side; a literal widens one unit up, a reference-less relative
/// amount runs from the already-resolved start.
fn end_instant(
    anchor: &DateAnchor,
    from: DateTime<Utc>,
    env: &mut ResolveEnv<'_>,
    issues: &mut Vec<ResolveIssue>,
) -> DateTime<Utc> {
    match anchor {
        DateAnchor::Literal {
            datetime,
            granularity,
        } => env
            .zone
            .to_utc(round(&mut env.tables, *granularity, *datetime)),
        DateAnchor::Now => env.now,
        DateAnchor::Relative {
            reference,
            amounts,
            direction,
        } => match reference {
            Some(_) => {
                let anchor = anchor_range(reference.as_ref(), env, issues);
                match direction {
                    RelativeDirection::After => amounts.advance(anchor.to, env.zone, 1),
                    RelativeDirection::Before => amounts.advance(anchor.from, env.zone, -1),
                }
            }
            None => {
                let sign = match direction {
                    RelativeDirection::After => 1,
                    RelativeDirection::Before => -1,
                };
                amounts.advance(from, env.zone, sign)
            }
        },
    }
}

fn anchor_range(
    reference: Option<&SmolStr>,
    env: &ResolveEnv<'_>,
    issues: &mut Vec<ResolveIssue>,
) -> DateRange {
    let fallback = DateRange {
        from: env.now,
        to: env.now,
    };
    match reference {
        Some(id) => match env.ids.get(id) {
            Some(range) => *range,
            None => {
                issues.push(ResolveIssue::MissingReference(id.clone()));
                fallback
            }
        },
        None => match env.prior {
            Some(range) => range,
            None => {
                issues.push(ResolveIssue::NoPriorEvent);
                fallback
            }
        },
    }
}

/// Weekday amounts land *on* the last working day, so the exclusive bound
/// is the end of that day.
fn landing_bound(amounts: &TimeSpan, instant: DateTime<Utc>, zone: Zone) -> DateTime<Utc> {
    if amounts.get(TimeUnit::Weekdays) != 0 && !amounts.has_clock_units() {
        zone.to_utc(DateGranularity::Day.round_up(zone.to_local(instant)))
    } else {
        instant
    }
}

fn round(
    tables: &mut Option<&mut ZoneCache>,
    granularity: DateGranularity,
    start: NaiveDateTime,
) -> NaiveDateTime {
    match tables.as_deref_mut() {
        Some(tables) => tables.rounded(granularity, start),
        None => granularity.round_up(start),
    }
}
