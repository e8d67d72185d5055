//! Per-timezone memo tables for date resolution.
//!
//! A literal date string always resolves to the same instants within one
//! timezone and component order, so resolved ranges are memoized keyed by
//! `(text, day_first)`. Relative and "now"-dependent expressions are never
//! stored. The range table is bounded with least-recently-used eviction;
//! the small helper tables are cleared wholesale when they grow past the
//! bound.

use chrono::{NaiveDate, NaiveDateTime};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::dates::DateRange;
use crate::dates::granularity::DateGranularity;

/// Slash-date resolution keyed by `(text, day_first)`; `None` records that
/// the components do not form a calendar date under that order.
pub(crate) type SlashTable = FxHashMap<(SmolStr, bool), Option<NaiveDate>>;

const RANGE_TABLE_CAPACITY: usize = 2048;
const HELPER_TABLE_CAPACITY: usize = 4096;

/// A resolved literal, as stored in the range table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CachedRange {
    pub range: DateRange,
    pub granularity: DateGranularity,
}

struct Stamped {
    value: CachedRange,
    stamp: u64,
}

/// The tables for one timezone.
#[derive(Default)]
pub(crate) struct ZoneCache {
    stamp: u64,
    ranges: FxHashMap<(SmolStr, bool), Stamped>,
    rounded: FxHashMap<(DateGranularity, NaiveDateTime), NaiveDateTime>,
    pub(crate) slash: SlashTable,
}

impl ZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolved literal by its exact source text, refreshing its
    /// eviction stamp. Slash dates read differently under the two component
    /// orders, so `day_first` is part of the key.
    pub fn range(&mut self, literal: &str, day_first: bool) -> Option<CachedRange> {
        self.stamp += 1;
        let stamp = self.stamp;
        let hit = self
            .ranges
            .get_mut(&(SmolStr::new(literal), day_first))
            .map(|entry| {
                entry.stamp = stamp;
                entry.value
            });
        if hit.is_some() {
            tracing::trace!("[DATES] memo hit for '{literal}'");
        }
        hit
    }

    pub fn insert_range(&mut self, literal: &str, day_first: bool, value: CachedRange) {
        let key = (SmolStr::new(literal), day_first);
        if self.ranges.len() >= RANGE_TABLE_CAPACITY && !self.ranges.contains_key(&key) {
            self.evict_oldest();
        }
        self.stamp += 1;
        self.ranges.insert(
            key,
            Stamped {
                value,
                stamp: self.stamp,
            },
        );
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .ranges
            .iter()
            .min_by_key(|(_, entry)| entry.stamp)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.ranges.remove(&key);
        }
    }

    /// Memoized one-unit-up rounding.
    pub fn rounded(&mut self, granularity: DateGranularity, start: NaiveDateTime) -> NaiveDateTime {
        if self.rounded.len() >= HELPER_TABLE_CAPACITY {
            self.rounded.clear();
        }
        *self
            .rounded
            .entry((granularity, start))
            .or_insert_with(|| granularity.round_up(start))
    }

    /// The slash table, bounded the same way as the rounding table.
    pub fn slash_table(&mut self) -> &mut SlashTable {
        if self.slash.len() >= HELPER_TABLE_CAPACITY {
            self.slash.clear();
        }
        &mut self.slash
    }

    #[cfg(test)]
    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }
}
