//! Bounded deduplication ring for the watch views.
//!
//! Remembers the last [`DEFAULT_CAPACITY`] event keys so repeated catalog
//! polls only surface new or revised events. Memory stays bounded no
//! matter how long a watch runs.

use std::collections::VecDeque;

use crate::models::Quake;

/// Default capacity for the deduplication ring.
pub const DEFAULT_CAPACITY: usize = 5_000;

/// A bounded ring buffer for deduplicating events by id.
#[derive(Debug)]
pub struct DedupeRing {
    /// Seen entries, oldest at front
    seen: VecDeque<SeenEntry>,
    capacity: usize,
    total_seen: u64,
    total_dupes: u64,
}

#[derive(Debug, Clone)]
struct SeenEntry {
    id: String,
    /// Magnitude and depth as last seen; a change means the event was revised
    fingerprint: String,
}

/// Revision fingerprint of an event.
#[must_use]
pub fn fingerprint(quake: &Quake) -> String {
    format!("{:?}|{:?}", quake.magnitude, quake.depth_km)
}

/// Identity of an event across polls.
///
/// Synthesized ids embed the response position, which shifts as new events
/// arrive, so those events are keyed by time and position instead.
#[must_use]
pub fn event_key(quake: &Quake) -> String {
    if quake.synthetic_id {
        format!(
            "{}|{:?}|{:?}",
            quake.raw_time.as_deref().unwrap_or_default(),
            quake.latitude,
            quake.longitude
        )
    } else {
        quake.id.clone()
    }
}

impl DedupeRing {
    /// Create a new deduplication ring with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");

        Self {
            seen: VecDeque::with_capacity(capacity),
            capacity,
            total_seen: 0,
            total_dupes: 0,
        }
    }

    /// Create a new deduplication ring with default capacity.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Classify an event and remember it.
    pub fn check(&mut self, quake: &Quake) -> DedupeResult {
        self.check_and_mark(&event_key(quake), &fingerprint(quake))
    }

    /// Classify an id/fingerprint pair and remember it.
    pub fn check_and_mark(&mut self, id: &str, fingerprint: &str) -> DedupeResult {
        self.total_seen += 1;

        if let Some(pos) = self.seen.iter().position(|e| e.id == id) {
            if self.seen[pos].fingerprint != fingerprint {
                self.seen[pos].fingerprint = fingerprint.to_string();
                return DedupeResult::Updated;
            }
            self.total_dupes += 1;
            return DedupeResult::Duplicate;
        }

        if self.seen.len() >= self.capacity {
            self.seen.pop_front();
        }
        self.seen.push_back(SeenEntry {
            id: id.to_string(),
            fingerprint: fingerprint.to_string(),
        });
        debug_assert!(self.seen.len() <= self.capacity);

        DedupeResult::New
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Get the deduplication rate (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn dupe_rate(&self) -> f64 {
        if self.total_seen == 0 {
            0.0
        } else {
            self.total_dupes as f64 / self.total_seen as f64
        }
    }
}

impl Default for DedupeRing {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Result of a deduplication check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeResult {
    /// Never seen before
    New,
    /// Seen, but magnitude or depth changed
    Updated,
    /// Seen with identical values
    Duplicate,
}

impl DedupeResult {
    #[must_use]
    pub fn should_emit(self) -> bool {
        !matches!(self, Self::Duplicate)
    }

    #[must_use]
    pub fn is_update(self) -> bool {
        matches!(self, Self::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_duplicate() {
        let mut ring = DedupeRing::new(100);

        assert_eq!(ring.check_and_mark("a", "x"), DedupeResult::New);
        assert_eq!(ring.check_and_mark("b", "x"), DedupeResult::New);
        assert_eq!(ring.check_and_mark("a", "x"), DedupeResult::Duplicate);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_revision_is_update() {
        let mut ring = DedupeRing::new(100);

        assert_eq!(ring.check_and_mark("a", "4.1"), DedupeResult::New);
        assert_eq!(ring.check_and_mark("a", "4.3"), DedupeResult::Updated);
        assert_eq!(ring.check_and_mark("a", "4.3"), DedupeResult::Duplicate);
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn test_bounded_capacity() {
        let mut ring = DedupeRing::new(3);

        for id in ["e1", "e2", "e3", "e4"] {
            ring.check_and_mark(id, "");
        }
        assert_eq!(ring.len(), 3);

        // e1 was evicted
        assert_eq!(ring.check_and_mark("e1", ""), DedupeResult::New);
        assert_eq!(ring.check_and_mark("e4", ""), DedupeResult::Duplicate);
    }

    #[test]
    fn test_quake_fingerprint() {
        let record: crate::models::KatalogRecord =
            serde_json::from_str(r#"{"id":"q1","mag":4.0,"depth":10}"#).unwrap();
        let mut quake = Quake::from_record(&record, 0);
        let mut ring = DedupeRing::new(10);

        assert_eq!(ring.check(&quake), DedupeResult::New);
        quake.magnitude = Some(4.2);
        assert!(ring.check(&quake).is_update());
        assert!(!ring.check(&quake).should_emit());
    }

    #[test]
    fn test_synthetic_ids_survive_position_shift() {
        let older: crate::models::KatalogRecord =
            serde_json::from_str(r#"{"tgl":"2024-06-12 10:00:00","lat":-7.1,"lon":110.2,"mag":3.0}"#).unwrap();
        let newer: crate::models::KatalogRecord =
            serde_json::from_str(r#"{"tgl":"2024-06-12 11:00:00","lat":-1.0,"lon":120.0,"mag":4.0}"#).unwrap();
        let mut ring = DedupeRing::new(10);

        let first = Quake::from_records(std::slice::from_ref(&older));
        assert_eq!(ring.check(&first[0]), DedupeResult::New);

        // A new event is prepended; the old one moves to index 1
        let second = Quake::from_records(&[newer, older]);
        assert_ne!(first[0].id, second[1].id);
        assert_eq!(ring.check(&second[0]), DedupeResult::New);
        assert_eq!(ring.check(&second[1]), DedupeResult::Duplicate);
    }

    #[test]
    fn test_dupe_rate() {
        let mut ring = DedupeRing::new(100);

        ring.check_and_mark("a", "");
        ring.check_and_mark("a", "");
        ring.check_and_mark("a", "");
        ring.check_and_mark("b", "");

        assert!((ring.dupe_rate() - 0.5).abs() < 0.01);
    }
}
