//! Configured entry points: a reusable `Engine` and an async wrapper.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{EngineConfig, TransportOptions};
use crate::control::CancelToken;
use crate::descriptor::Descriptor;
use crate::failure::{ClassifiedError, ErrorContext, ErrorKind};
use crate::probe::{self, ResolvedMirror};

use super::events::BatchObserver;
use super::outcome::{BatchFailure, BatchReport};
use super::run::run_batch;

/// Batch runner bound to one configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    transport: TransportOptions,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let transport = config.transport();
        Self { config, transport }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a batch with the configured concurrency and per-item timeout.
    pub fn run(
        &self,
        descriptors: &[Descriptor],
        total_expected_bytes: u64,
        cancel: &CancelToken,
        observer: &dyn BatchObserver,
    ) -> Result<BatchReport, BatchFailure> {
        run_batch(
            descriptors,
            total_expected_bytes,
            self.config.concurrency,
            self.config.item_timeout(),
            cancel,
            observer,
            &self.transport,
        )
    }

    /// Resolve `relative_path` against `hosts` in order.
    pub fn probe_mirrors(
        &self,
        relative_path: &str,
        hosts: &[String],
        cancel: &CancelToken,
    ) -> Option<ResolvedMirror> {
        probe::probe_mirrors(relative_path, hosts, &self.transport, cancel)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// `run_batch` for async callers. The pool runs on tokio's blocking threads;
/// the returned future resolves once the batch has settled.
pub async fn run_batch_async(
    descriptors: Vec<Descriptor>,
    total_expected_bytes: u64,
    concurrency_limit: usize,
    item_timeout: Duration,
    cancel: CancelToken,
    observer: Arc<dyn BatchObserver>,
    transport: TransportOptions,
) -> Result<BatchReport, BatchFailure> {
    let total = descriptors.len();
    let joined = tokio::task::spawn_blocking(move || {
        run_batch(
            &descriptors,
            total_expected_bytes,
            concurrency_limit,
            item_timeout,
            &cancel,
            observer.as_ref(),
            &transport,
        )
    })
    .await;
    match joined {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "batch task did not finish");
            Err(BatchFailure {
                error: ClassifiedError::new(
                    ErrorKind::Other,
                    format!("batch task failed: {e}"),
                    ErrorContext::default(),
                ),
                report: BatchReport::new(total),
            })
        }
    }
}
