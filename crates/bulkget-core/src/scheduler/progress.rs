//! Aggregate progress shared by every transfer of a batch.
//!
//! Byte counts are added by transfers as chunks land; completed/failed counts
//! are only touched by the batch thread when an outcome arrives. The estimator
//! reads a snapshot on its own cadence.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

#[derive(Debug)]
pub struct AggregateProgress {
    bytes_transferred: AtomicU64,
    completed: AtomicUsize,
    failed: AtomicUsize,
    total_expected: u64,
}

impl AggregateProgress {
    pub fn new(total_expected: u64) -> Self {
        Self {
            bytes_transferred: AtomicU64::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            total_expected,
        }
    }

    /// Add `n` bytes and return the new batch total.
    pub fn add_bytes(&self, n: u64) -> u64 {
        self.bytes_transferred.fetch_add(n, Ordering::Relaxed) + n
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::Relaxed)
    }

    pub fn total_expected(&self) -> u64 {
        self.total_expected
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            bytes_transferred: self.bytes_transferred(),
            total_expected: self.total_expected,
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub bytes_transferred: u64,
    pub total_expected: u64,
    pub completed: usize,
    pub failed: usize,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_expected == 0 {
            return 1.0;
        }
        (self.bytes_transferred as f64 / self.total_expected as f64).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let p = AggregateProgress::new(100);
        assert_eq!(p.add_bytes(30), 30);
        assert_eq!(p.add_bytes(20), 50);
        p.record_completed();
        p.record_failed();
        p.record_completed();
        let s = p.snapshot();
        assert_eq!(s.bytes_transferred, 50);
        assert_eq!(s.completed, 2);
        assert_eq!(s.failed, 1);
        assert!((s.fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn fraction_is_capped_and_handles_zero_total() {
        let p = AggregateProgress::new(10);
        p.add_bytes(25);
        assert_eq!(p.snapshot().fraction(), 1.0);
        assert_eq!(AggregateProgress::new(0).snapshot().fraction(), 1.0);
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let p = AggregateProgress::new(0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        p.add_bytes(1);
                    }
                });
            }
        });
        assert_eq!(p.bytes_transferred(), 4000);
    }
}
