//! Observable batch events: progress, speed, time remaining, item errors.

use crate::failure::ClassifiedError;
use crate::throughput::Eta;

/// Receiver of batch events. All methods default to no-ops, so implementors
/// only override the channels they care about.
///
/// Called from worker threads (`on_progress`), the estimator thread
/// (`on_speed`, `on_eta`) and the batch thread (`on_error`), so
/// implementations must be cheap and thread-safe.
pub trait BatchObserver: Send + Sync {
    /// Batch-wide bytes so far. `label` names the item whose chunk just landed;
    /// it is `None` for the final settled total.
    fn on_progress(&self, _bytes_so_far: u64, _total_expected: u64, _label: Option<&str>) {}

    /// Smoothed speed in bytes per second.
    fn on_speed(&self, _bytes_per_sec: f64) {}

    fn on_eta(&self, _eta: Eta) {}

    /// One item failed. Emitted once per failed item.
    fn on_error(&self, _error: &ClassifiedError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Tagged form of the observer callbacks, for channel-based consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Progress {
        bytes_so_far: u64,
        total_expected: u64,
        label: Option<String>,
    },
    Speed(f64),
    Eta(Eta),
    Error(ClassifiedError),
}

impl BatchEvent {
    fn progress(bytes_so_far: u64, total_expected: u64, label: Option<&str>) -> Self {
        BatchEvent::Progress {
            bytes_so_far,
            total_expected,
            label: label.map(str::to_string),
        }
    }
}

// A dropped receiver just means nobody is listening any more.

impl BatchObserver for std::sync::mpsc::Sender<BatchEvent> {
    fn on_progress(&self, bytes_so_far: u64, total_expected: u64, label: Option<&str>) {
        let _ = self.send(BatchEvent::progress(bytes_so_far, total_expected, label));
    }

    fn on_speed(&self, bytes_per_sec: f64) {
        let _ = self.send(BatchEvent::Speed(bytes_per_sec));
    }

    fn on_eta(&self, eta: Eta) {
        let _ = self.send(BatchEvent::Eta(eta));
    }

    fn on_error(&self, error: &ClassifiedError) {
        let _ = self.send(BatchEvent::Error(error.clone()));
    }
}

impl BatchObserver for tokio::sync::mpsc::UnboundedSender<BatchEvent> {
    fn on_progress(&self, bytes_so_far: u64, total_expected: u64, label: Option<&str>) {
        let _ = self.send(BatchEvent::progress(bytes_so_far, total_expected, label));
    }

    fn on_speed(&self, bytes_per_sec: f64) {
        let _ = self.send(BatchEvent::Speed(bytes_per_sec));
    }

    fn on_eta(&self, eta: Eta) {
        let _ = self.send(BatchEvent::Eta(eta));
    }

    fn on_error(&self, error: &ClassifiedError) {
        let _ = self.send(BatchEvent::Error(error.clone()));
    }
}
