//! Deduplication of events arriving via both delivery paths.
//!
//! The live channel and the worker relay can each deliver the same
//! physical event. The index buckets timestamps into a tolerance window
//! and treats `(machine, kind, bucket)` as the identity of an event:
//! idempotent set insertion, not message coordination.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use machinehub_core::types::{EventKind, MachineId};

/// Entries older than this many windows are evicted on insert.
const RETAIN_WINDOWS: i64 = 10;

/// Idempotent event identity set.
#[derive(Debug)]
pub struct DedupIndex {
    /// Window duration in milliseconds.
    window_ms: i64,
    /// Seen event keys and their timestamps, for eviction.
    seen: HashMap<String, DateTime<Utc>>,
}

impl DedupIndex {
    /// Create an index with the given tolerance window.
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms: (window_ms as i64).max(1),
            seen: HashMap::new(),
        }
    }

    /// Record an event identity.
    ///
    /// Returns `true` for a first sighting, `false` for a duplicate of an
    /// already-seen event.
    pub fn insert(
        &mut self,
        machine_id: &MachineId,
        kind: EventKind,
        timestamp: &DateTime<Utc>,
    ) -> bool {
        let key = self.make_key(machine_id, kind, timestamp);
        if self.seen.contains_key(&key) {
            return false;
        }
        self.seen.insert(key, *timestamp);
        self.evict(timestamp);
        true
    }

    fn make_key(
        &self,
        machine_id: &MachineId,
        kind: EventKind,
        timestamp: &DateTime<Utc>,
    ) -> String {
        let bucket = timestamp.timestamp_millis().div_euclid(self.window_ms);
        format!("{machine_id}:{kind}:{bucket}")
    }

    fn evict(&mut self, now: &DateTime<Utc>) {
        let cutoff = self.window_ms * RETAIN_WINDOWS;
        let now_ms = now.timestamp_millis();
        self.seen
            .retain(|_, ts| (now_ms - ts.timestamp_millis()).abs() < cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mid(s: &str) -> MachineId {
        MachineId::parse(s).unwrap()
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_same_bucket_is_duplicate() {
        let mut index = DedupIndex::new(2_000);
        let ts = at(1_000_000);
        assert!(index.insert(&mid("5"), EventKind::CoinInserted, &ts));
        assert!(!index.insert(&mid("5"), EventKind::CoinInserted, &ts));
        // Slightly later but same bucket.
        assert!(!index.insert(&mid("5"), EventKind::CoinInserted, &at(1_000_900)));
    }

    #[test]
    fn test_distinct_machines_and_kinds_pass() {
        let mut index = DedupIndex::new(2_000);
        let ts = at(1_000_000);
        assert!(index.insert(&mid("5"), EventKind::CoinInserted, &ts));
        assert!(index.insert(&mid("6"), EventKind::CoinInserted, &ts));
        assert!(index.insert(&mid("5"), EventKind::MachineOff, &ts));
    }

    #[test]
    fn test_later_bucket_passes() {
        let mut index = DedupIndex::new(2_000);
        assert!(index.insert(&mid("5"), EventKind::CoinInserted, &at(1_000_000)));
        assert!(index.insert(&mid("5"), EventKind::CoinInserted, &at(1_004_000)));
    }

    #[test]
    fn test_old_entries_are_evicted() {
        let mut index = DedupIndex::new(1_000);
        assert!(index.insert(&mid("5"), EventKind::CoinInserted, &at(0)));
        // A much later event evicts the old entry...
        assert!(index.insert(&mid("5"), EventKind::CoinInserted, &at(60_000)));
        assert!(index.seen.len() == 1);
    }
}
