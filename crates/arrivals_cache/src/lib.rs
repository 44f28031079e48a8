//! Hot, TTL-bounded index of per-platform arrival predictions.
//!
//! This is the present-tense store the router and any live-boarding-time
//! consumer reads: the feed poller is the only writer, replacing one
//! `(base_stop_id, direction)` entry at a time as fresh predictions arrive.
//! Staleness is tracked by wall-clock elapsed time rather than by the
//! feed-supplied timestamp, so `get`/`get_feed_age` behave sanely even if a
//! feed's clock disagrees with ours.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Default time-to-live for a cached prediction batch, matching the
/// reference feed's poll cadence with headroom for one missed cycle.
pub const DEFAULT_TTL_SECONDS: u64 = 90;

/// A single expected arrival at a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub route_id: String,
    pub headsign: String,
    pub eta_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

/// Snapshot of cache health, suitable for a collaborator health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    pub ok: bool,
    pub entry_count: usize,
    pub feed_age_seconds: Option<u64>,
}

struct Entry {
    predictions: Vec<Prediction>,
    as_of_ts: i64,
    inserted_at: Instant,
}

/// Concurrent map keyed by `(base_stop_id, direction)`. A single writer per
/// key at a time is the common case (one poll cycle at a time per platform),
/// but the map itself tolerates concurrent writers to different keys without
/// any external locking.
pub struct ArrivalsCache {
    config: CacheConfig,
    entries: DashMap<(String, char), Entry>,
    feed_last_update: DashMap<(), Instant>,
}

impl ArrivalsCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            feed_last_update: DashMap::new(),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_seconds)
    }

    fn is_live(&self, inserted_at: Instant) -> bool {
        inserted_at.elapsed() <= self.ttl()
    }

    /// Atomically replaces the prediction batch for `(base_stop_id, direction)`.
    pub fn put(
        &self,
        base_stop_id: &str,
        direction: char,
        predictions: Vec<Prediction>,
        as_of_ts: i64,
    ) {
        self.entries.insert(
            (base_stop_id.to_owned(), direction),
            Entry {
                predictions,
                as_of_ts,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Returns the live prediction batch for `(base_stop_id, direction)`, or
    /// `None` if there is no entry or it has aged past the TTL.
    pub fn get(&self, base_stop_id: &str, direction: char) -> Option<Vec<Prediction>> {
        let key = (base_stop_id.to_owned(), direction);
        let entry = self.entries.get(&key)?;
        if self.is_live(entry.inserted_at) {
            Some(entry.predictions.clone())
        } else {
            None
        }
    }

    /// The `as_of_ts` recorded on the live entry for `(base_stop_id, direction)`,
    /// if one exists and has not expired.
    pub fn as_of(&self, base_stop_id: &str, direction: char) -> Option<i64> {
        let key = (base_stop_id.to_owned(), direction);
        let entry = self.entries.get(&key)?;
        self.is_live(entry.inserted_at).then_some(entry.as_of_ts)
    }

    /// Marks that a full poll cycle completed at `ts`. Only the elapsed
    /// wall-clock time since this call matters to `get_feed_age`; `ts` is
    /// retained only for callers that want to correlate it with entry
    /// `as_of_ts` values.
    pub fn set_feed_update(&self, _ts: i64) {
        self.feed_last_update.insert((), Instant::now());
    }

    pub fn get_feed_age(&self) -> Option<u64> {
        self.feed_last_update
            .get(&())
            .map(|at| at.elapsed().as_secs())
    }

    /// Base stop ids with at least one live (non-expired) entry, in any
    /// direction.
    pub fn list_stops_with_entries(&self) -> Vec<String> {
        let mut stops: Vec<String> = self
            .entries
            .iter()
            .filter(|kv| self.is_live(kv.value().inserted_at))
            .map(|kv| kv.key().0.clone())
            .collect();
        stops.sort();
        stops.dedup();
        stops
    }

    pub fn health(&self) -> CacheHealth {
        let feed_age_seconds = self.get_feed_age();
        CacheHealth {
            ok: feed_age_seconds.is_some(),
            entry_count: self.entries.len(),
            feed_age_seconds,
        }
    }
}

impl Default for ArrivalsCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(route_id: &str, eta_seconds: i64) -> Prediction {
        Prediction {
            route_id: route_id.to_owned(),
            headsign: format!("{route_id} Train"),
            eta_seconds,
        }
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = ArrivalsCache::default();
        cache.put("127", 'N', vec![prediction("A", 90)], 1_000);
        let got = cache.get("127", 'N').unwrap();
        assert_eq!(got, vec![prediction("A", 90)]);
        assert_eq!(cache.as_of("127", 'N'), Some(1_000));
    }

    #[test]
    fn missing_entry_is_absent() {
        let cache = ArrivalsCache::default();
        assert!(cache.get("127", 'N').is_none());
    }

    #[test]
    fn entries_older_than_the_ttl_are_invisible_to_readers() {
        let cache = ArrivalsCache::new(CacheConfig { ttl_seconds: 0 });
        cache.put("127", 'N', vec![prediction("A", 90)], 1_000);
        // ttl_seconds = 0 means anything already elapsed (even a few
        // nanoseconds) is stale.
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("127", 'N').is_none());
    }

    #[test]
    fn get_feed_age_is_near_zero_right_after_set_feed_update() {
        let cache = ArrivalsCache::default();
        assert!(cache.get_feed_age().is_none());
        cache.set_feed_update(1_700_000_000);
        let age = cache.get_feed_age().unwrap();
        assert!(age <= 1, "expected a fresh age, got {age}s");
    }

    #[test]
    fn list_stops_with_entries_dedupes_across_directions() {
        let cache = ArrivalsCache::default();
        cache.put("127", 'N', vec![prediction("A", 90)], 1_000);
        cache.put("127", 'S', vec![prediction("A", 120)], 1_000);
        cache.put("132", 'N', vec![prediction("A", 60)], 1_000);
        assert_eq!(
            cache.list_stops_with_entries(),
            vec!["127".to_owned(), "132".to_owned()]
        );
    }

    #[test]
    fn health_reports_entry_count_and_freshness() {
        let cache = ArrivalsCache::default();
        assert!(!cache.health().ok);
        cache.put("127", 'N', vec![prediction("A", 90)], 1_000);
        cache.set_feed_update(1_000);
        let health = cache.health();
        assert!(health.ok);
        assert_eq!(health.entry_count, 1);
        assert!(health.feed_age_seconds.is_some());
    }
}
