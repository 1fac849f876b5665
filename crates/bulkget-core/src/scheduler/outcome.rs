//! Batch results: per-item failures folded into one report.

use std::time::Duration;

use crate::descriptor::Descriptor;
use crate::failure::ClassifiedError;

/// One failed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Index of the descriptor in the submitted batch.
    pub index: usize,
    pub error: ClassifiedError,
}

/// Summary of a settled batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of descriptors submitted.
    pub total: usize,
    pub completed: usize,
    /// Failures in the order they were observed.
    pub failed: Vec<ItemFailure>,
    /// Descriptors never started because the batch was cancelled.
    pub not_admitted: usize,
    pub bytes_transferred: u64,
    /// Worker count after clamping.
    pub concurrency: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// First non-recoverable failure, else the first failure.
    pub fn decisive_failure(&self) -> Option<&ItemFailure> {
        self.failed
            .iter()
            .find(|f| !f.error.recoverable)
            .or_else(|| self.failed.first())
    }
}

/// A batch that did not complete every descriptor.
#[derive(Debug, Clone, thiserror::Error)]
#[error("batch failed ({} of {} completed): {error}", .report.completed, .report.total)]
pub struct BatchFailure {
    /// First non-recoverable item error, else the first item error; a
    /// cancellation error when the batch was cancelled.
    pub error: ClassifiedError,
    pub report: BatchReport,
}

impl BatchFailure {
    /// True when no recorded failure is fatal: resubmitting the failed items
    /// is plausibly worthwhile.
    pub fn is_recoverable(&self) -> bool {
        self.error.recoverable && self.report.failed.iter().all(|f| f.error.recoverable)
    }

    /// Indices of items whose failure was recoverable, in batch order.
    pub fn retryable_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .report
            .failed
            .iter()
            .filter(|f| f.error.recoverable)
            .map(|f| f.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Fresh copies of the descriptors worth resubmitting.
    pub fn retryable_descriptors(&self, submitted: &[Descriptor]) -> Vec<Descriptor> {
        self.retryable_indices()
            .into_iter()
            .filter_map(|i| submitted.get(i).cloned())
            .collect()
    }
}
