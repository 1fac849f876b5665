//! Bounded worker pool over a batch of descriptors.
//!
//! Workers pull descriptor indices from a shared FIFO queue and send each
//! outcome back to the batch thread, which folds them into the report. The
//! queue is only popped while the batch is live, so cancellation stops
//! admission immediately; in-flight transfers notice it in their curl
//! callbacks.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::TransportOptions;
use crate::control::CancelToken;
use crate::descriptor::Descriptor;
use crate::failure::{ClassifiedError, ErrorContext, ErrorKind};

use super::events::BatchObserver;
use super::outcome::{BatchFailure, BatchReport, ItemFailure};
use super::progress::AggregateProgress;
use super::ticker::run_ticker;
use super::transfer::{run_transfer, TransferEnv};

/// Worker count for a batch of `len` items: at least 1, never more than `len`.
pub fn effective_concurrency(limit: usize, len: usize) -> usize {
    limit.clamp(1, len.max(1))
}

/// Download every descriptor with at most `concurrency_limit` transfers in
/// flight. Blocks until each admitted descriptor has settled.
///
/// Items fail independently: a failed item is reported to the observer and
/// recorded, and the remaining items keep running. The batch succeeds only if
/// every descriptor completed.
pub fn run_batch(
    descriptors: &[Descriptor],
    total_expected_bytes: u64,
    concurrency_limit: usize,
    item_timeout: Duration,
    cancel: &CancelToken,
    observer: &dyn BatchObserver,
    transport: &TransportOptions,
) -> Result<BatchReport, BatchFailure> {
    let mut report = BatchReport::new(descriptors.len());
    if descriptors.is_empty() {
        tracing::debug!("empty batch");
        return Ok(report);
    }

    let started = Instant::now();
    let workers = effective_concurrency(concurrency_limit, descriptors.len());
    report.concurrency = workers;
    tracing::info!(
        items = descriptors.len(),
        workers,
        total_expected_bytes,
        "batch started"
    );

    let progress = AggregateProgress::new(total_expected_bytes);
    let queue: Mutex<VecDeque<usize>> = Mutex::new((0..descriptors.len()).collect());
    let env = TransferEnv {
        transport,
        item_timeout,
        cancel,
        progress: &progress,
        observer,
    };

    thread::scope(|s| {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = transport.tick_interval;
        let progress_ref = &progress;
        s.spawn(move || run_ticker(progress_ref, interval, cancel, observer, stop_rx));

        let (tx, rx) = mpsc::channel::<(usize, Result<u64, ClassifiedError>)>();
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            let env = &env;
            s.spawn(move || loop {
                if env.cancel.is_cancelled() {
                    break;
                }
                let index = match queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front()
                {
                    Some(i) => i,
                    None => break,
                };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    run_transfer(index, &descriptors[index], env)
                }))
                .unwrap_or_else(|_| {
                    Err(ClassifiedError::new(
                        ErrorKind::Other,
                        "transfer worker panicked",
                        ErrorContext::default()
                            .with_path(&descriptors[index].destination)
                            .with_index(index),
                    ))
                });
                if tx.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for (index, outcome) in rx {
            match outcome {
                Ok(_) => {
                    progress.record_completed();
                    report.completed += 1;
                }
                Err(error) => {
                    progress.record_failed();
                    tracing::warn!(index, kind = %error.kind, recoverable = error.recoverable, "{}", error);
                    observer.on_error(&error);
                    report.failed.push(ItemFailure { index, error });
                }
            }
        }

        // Every worker has exited; stop the estimator before the scope joins it.
        drop(stop_tx);
    });

    report.not_admitted = queue
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .len();
    report.bytes_transferred = progress.bytes_transferred();
    report.elapsed = started.elapsed();
    observer.on_progress(report.bytes_transferred, total_expected_bytes, None);

    tracing::info!(
        completed = report.completed,
        failed = report.failed.len(),
        not_admitted = report.not_admitted,
        bytes = report.bytes_transferred,
        elapsed = ?report.elapsed,
        "batch settled"
    );
    settle(report, cancel)
}

fn settle(report: BatchReport, cancel: &CancelToken) -> Result<BatchReport, BatchFailure> {
    let interrupted = report.not_admitted > 0
        || report
            .failed
            .iter()
            .any(|f| f.error.kind == ErrorKind::Cancelled);
    if cancel.is_cancelled() && interrupted {
        return Err(BatchFailure {
            error: ClassifiedError::cancelled(ErrorContext::default()),
            report,
        });
    }
    match report.decisive_failure() {
        None => Ok(report),
        Some(decisive) => Err(BatchFailure {
            error: decisive.error.clone(),
            report,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::events::NoopObserver;

    #[test]
    fn concurrency_is_clamped_to_batch_size() {
        assert_eq!(effective_concurrency(0, 5), 1);
        assert_eq!(effective_concurrency(3, 5), 3);
        assert_eq!(effective_concurrency(50, 5), 5);
        assert_eq!(effective_concurrency(4, 0), 1);
    }

    #[test]
    fn empty_batch_succeeds_without_work() {
        let report = run_batch(
            &[],
            0,
            8,
            Duration::from_secs(1),
            &CancelToken::new(),
            &NoopObserver,
            &TransportOptions::default(),
        )
        .unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.completed, 0);
    }

    #[test]
    fn cancelled_before_start_admits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let descriptors: Vec<Descriptor> = (0..3)
            .map(|i| {
                Descriptor::new(
                    format!("http://127.0.0.1:9/{i}"),
                    dir.path().join(format!("{i}.bin")),
                )
            })
            .collect();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_batch(
            &descriptors,
            0,
            2,
            Duration::from_secs(1),
            &cancel,
            &NoopObserver,
            &TransportOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::Cancelled);
        assert_eq!(err.report.not_admitted, 3);
        assert_eq!(err.report.completed, 0);
        assert!(err.report.failed.is_empty());
    }

    #[test]
    fn settle_prefers_fatal_over_first() {
        let mut report = BatchReport::new(3);
        report.completed = 1;
        report.failed.push(ItemFailure {
            index: 2,
            error: ClassifiedError::new(ErrorKind::Timeout, "slow", ErrorContext::default()),
        });
        report.failed.push(ItemFailure {
            index: 0,
            error: ClassifiedError::http_status(404, ErrorContext::default()),
        });
        let err = settle(report, &CancelToken::new()).unwrap_err();
        assert_eq!(err.error.kind, ErrorKind::HttpStatus);
        assert_eq!(err.report.failed.len(), 2);
    }

    #[test]
    fn settle_ignores_cancel_after_everything_finished() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut report = BatchReport::new(2);
        report.completed = 2;
        assert!(settle(report, &cancel).is_ok());
    }
}
