//! Estimator thread: samples aggregate progress on a fixed cadence and emits
//! speed and ETA until the batch stops it.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::control::CancelToken;
use crate::throughput::ThroughputEstimator;

use super::events::BatchObserver;
use super::progress::AggregateProgress;

/// Runs until `stop` is signalled or disconnected, or the batch is cancelled.
/// The batch drops the sender and joins this thread before it settles, so no
/// speed/ETA event is emitted after the batch result is returned.
pub(super) fn run_ticker(
    progress: &AggregateProgress,
    interval: Duration,
    cancel: &CancelToken,
    observer: &dyn BatchObserver,
    stop: Receiver<()>,
) {
    let mut estimator = ThroughputEstimator::new(progress.bytes_transferred());
    let mut last_tick = Instant::now();
    loop {
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if cancel.is_cancelled() {
            tracing::debug!("estimator stopped by cancellation");
            break;
        }
        let now = Instant::now();
        let elapsed = now.duration_since(last_tick);
        last_tick = now;

        let snapshot = progress.snapshot();
        let estimate = estimator.tick(
            snapshot.bytes_transferred,
            snapshot.total_expected,
            elapsed,
        );
        observer.on_speed(estimate.bytes_per_sec);
        observer.on_eta(estimate.eta);
    }
}
