//! Mutation counters for the concurrent index wrappers.
//!
//! Stats focus on the write path: how often the owner rebuilds versus
//! patches incrementally, and how often incremental patches hit the silent
//! no-op cases (duplicate add, missed remove). Read operations are not
//! counted. Counters are plain relaxed atomics; a snapshot is not a
//! consistent cut across fields under concurrent mutation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of index-level mutation counters.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use indexkit::index::ConcurrentIdIndex;
///
/// let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
/// let entity = Arc::new(1u64);
/// index.add(&entity);
/// index.add(&entity); // silent no-op, counted separately
///
/// let stats = index.stats();
/// assert_eq!(stats.adds, 1);
/// assert_eq!(stats.duplicate_adds, 1);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Completed full rebuilds.
    pub rebuilds: u64,
    /// Adds that inserted a new entry.
    pub adds: u64,
    /// Adds that were no-ops because the identifier was already present.
    pub duplicate_adds: u64,
    /// Removes that took an entry out.
    pub removes: u64,
    /// Removes that found nothing to take out.
    pub missed_removes: u64,
    /// Calls to `clear`.
    pub clears: u64,
}

/// Relaxed atomic counters behind the concurrent wrappers.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    rebuilds: AtomicU64,
    adds: AtomicU64,
    duplicate_adds: AtomicU64,
    removes: AtomicU64,
    missed_removes: AtomicU64,
    clears: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_rebuild(&self) {
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_add(&self) {
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_duplicate_add(&self) {
        self.duplicate_adds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_missed_remove(&self) {
        self.missed_removes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshots the current counter values.
    pub fn snapshot(&self) -> IndexStats {
        IndexStats {
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            adds: self.adds.load(Ordering::Relaxed),
            duplicate_adds: self.duplicate_adds.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            missed_removes: self.missed_removes.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_starts_at_zero() {
        let recorder = StatsRecorder::new();
        assert_eq!(recorder.snapshot(), IndexStats::default());
    }

    #[test]
    fn recorder_counts_each_kind() {
        let recorder = StatsRecorder::new();
        recorder.record_rebuild();
        recorder.record_add();
        recorder.record_add();
        recorder.record_duplicate_add();
        recorder.record_remove();
        recorder.record_missed_remove();
        recorder.record_clear();

        let stats = recorder.snapshot();
        assert_eq!(stats.rebuilds, 1);
        assert_eq!(stats.adds, 2);
        assert_eq!(stats.duplicate_adds, 1);
        assert_eq!(stats.removes, 1);
        assert_eq!(stats.missed_removes, 1);
        assert_eq!(stats.clears, 1);
    }
}
