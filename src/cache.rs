//! Reusable parse caches.
//!
//! Date resolution is the hot path of a parse: the same literal dates
//! appear on every keystroke, and rounding a wall-clock instant up to
//! the next month boundary is zone-dependent but otherwise pure. A
//! [`ParseCache`] keeps one memo table set per timezone so that
//! repeated parses of the same document, and incremental re-parses of
//! edited ones, skip the chrono arithmetic for everything already seen.
//!
//! The cache is an optional argument to parsing: results are identical
//! with or without it.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::dates::memo::ZoneCache;

/// Zones kept warm at once. Documents rarely scope more than a couple.
const ZONE_TABLE_CAPACITY: usize = 16;

struct ZoneEntry {
    tables: ZoneCache,
    last_access: u64,
}

/// Per-timezone memo tables, evicted least-recently-used.
pub struct ParseCache {
    zones: FxHashMap<SmolStr, ZoneEntry>,
    clock: u64,
}

impl ParseCache {
    pub fn new() -> Self {
        Self {
            zones: FxHashMap::default(),
            clock: 0,
        }
    }

    /// The memo tables for `zone`, created on first use.
    pub(crate) fn zone(&mut self, zone: &str) -> &mut ZoneCache {
        self.clock += 1;
        if !self.zones.contains_key(zone) && self.zones.len() >= ZONE_TABLE_CAPACITY {
            self.evict_oldest();
        }
        let entry = self
            .zones
            .entry(SmolStr::new(zone))
            .or_insert_with(|| ZoneEntry {
                tables: ZoneCache::new(),
                last_access: 0,
            });
        entry.last_access = self.clock;
        &mut entry.tables
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .zones
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.zones.remove(&key);
        }
    }

    /// Drop every memo table.
    pub fn clear(&mut self) {
        self.zones.clear();
        self.clock = 0;
    }

    #[cfg(test)]
    pub(crate) fn zone_count(&self) -> usize {
        self.zones.len()
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_tables_are_created_on_demand() {
        let mut cache = ParseCache::new();
        assert_eq!(cache.zone_count(), 0);
        cache.zone("UTC");
        cache.zone("America/New_York");
        cache.zone("UTC");
        assert_eq!(cache.zone_count(), 2);
    }

    #[test]
    fn test_least_recently_used_zone_is_evicted() {
        let mut cache = ParseCache::new();
        for i in 0..ZONE_TABLE_CAPACITY {
            cache.zone(&format!("Zone/{i}"));
        }
        assert_eq!(cache.zone_count(), ZONE_TABLE_CAPACITY);

        // Touch the first zone so the second becomes the oldest.
        cache.zone("Zone/0");
        cache.zone("Zone/fresh");

        assert_eq!(cache.zone_count(), ZONE_TABLE_CAPACITY);
        assert!(cache.zones.contains_key("Zone/0"));
        assert!(!cache.zones.contains_key("Zone/1"));
        assert!(cache.zones.contains_key("Zone/fresh"));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cache = ParseCache::new();
        cache.zone("UTC").slash_table();
        cache.clear();
        assert_eq!(cache.zone_count(), 0);
    }
}
