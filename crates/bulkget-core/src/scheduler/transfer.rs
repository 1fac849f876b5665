//! One transfer: optional mirror probe, streaming GET, write to disk.

use std::cell::{Cell, RefCell};
use std::str;
use std::time::{Duration, Instant};

use crate::config::TransportOptions;
use crate::control::CancelToken;
use crate::descriptor::{Descriptor, DownloadSource};
use crate::failure::{classify, ClassifiedError, ErrorContext, ErrorKind, TransferError};
use crate::probe::{self, parse};
use crate::storage::{self, StreamingWriter};

use super::events::BatchObserver;
use super::progress::AggregateProgress;

/// Lifecycle of a transfer. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    Queued,
    Probing,
    Transferring,
    Completed,
    Failed(ErrorKind),
}

/// Per-transfer bookkeeping, owned by the worker running it.
#[derive(Debug)]
struct TransferState {
    index: usize,
    /// Grows as body chunks land on disk.
    bytes_transferred: Cell<u64>,
    status: TransferStatus,
    started_at: Instant,
}

impl TransferState {
    fn new(index: usize) -> Self {
        Self {
            index,
            bytes_transferred: Cell::new(0),
            status: TransferStatus::Queued,
            started_at: Instant::now(),
        }
    }

    fn advance(&mut self, status: TransferStatus) {
        tracing::debug!(index = self.index, from = ?self.status, to = ?status, "transfer state");
        self.status = status;
    }
}

/// Shared, read-only inputs of every transfer in a batch.
pub(super) struct TransferEnv<'a> {
    pub transport: &'a TransportOptions,
    pub item_timeout: Duration,
    pub cancel: &'a CancelToken,
    pub progress: &'a AggregateProgress,
    pub observer: &'a dyn BatchObserver,
}

/// Drive one descriptor to a terminal state. Returns bytes written.
pub(super) fn run_transfer(
    index: usize,
    descriptor: &Descriptor,
    env: &TransferEnv<'_>,
) -> Result<u64, ClassifiedError> {
    let mut state = TransferState::new(index);
    let mut context = ErrorContext::default()
        .with_path(&descriptor.destination)
        .with_index(index);
    context.url = Some(descriptor.source_display().to_string());

    let result = resolve_and_fetch(descriptor, env, &mut state, &mut context);
    match result {
        Ok(bytes) => {
            state.advance(TransferStatus::Completed);
            tracing::debug!(
                index,
                bytes,
                elapsed = ?state.started_at.elapsed(),
                "transfer completed"
            );
            Ok(bytes)
        }
        Err(e) => {
            // Whatever broke after the token fired is a consequence of it.
            let e = if env.cancel.is_cancelled() {
                TransferError::Cancelled
            } else {
                e
            };
            let mut err = classify(&e, context);
            if err.kind == ErrorKind::Timeout {
                err.context.timeout = Some(env.item_timeout);
            }
            tracing::debug!(
                index,
                bytes = state.bytes_transferred.get(),
                kind = %err.kind,
                "transfer failed"
            );
            state.advance(TransferStatus::Failed(err.kind));
            Err(err)
        }
    }
}

fn resolve_and_fetch(
    descriptor: &Descriptor,
    env: &TransferEnv<'_>,
    state: &mut TransferState,
    context: &mut ErrorContext,
) -> Result<u64, TransferError> {
    if env.cancel.is_cancelled() {
        return Err(TransferError::Cancelled);
    }
    let url = match &descriptor.source {
        DownloadSource::Direct(url) => url.clone(),
        DownloadSource::Mirrored { path, hosts } => {
            state.advance(TransferStatus::Probing);
            let resolved = probe::probe_mirrors(path, hosts, env.transport, env.cancel)
                .ok_or_else(|| TransferError::NoMirror {
                    path: path.clone(),
                    tried: hosts.len(),
                })?;
            context.url = Some(resolved.url.clone());
            resolved.url
        }
    };

    state.advance(TransferStatus::Transferring);
    storage::ensure_dir(&descriptor.folder)?;
    let bytes = fetch_to_file(&url, descriptor, env, &state.bytes_transferred)?;

    if let Some(expected) = descriptor.expected_len {
        if bytes != expected {
            return Err(TransferError::LengthMismatch {
                expected,
                received: bytes,
            });
        }
    }
    Ok(bytes)
}

/// GET `url` and stream the 2xx body into the descriptor's destination.
/// Error bodies are discarded, so a 404 leaves nothing on disk.
fn fetch_to_file(
    url: &str,
    descriptor: &Descriptor,
    env: &TransferEnv<'_>,
    item_bytes: &Cell<u64>,
) -> Result<u64, TransferError> {
    let label = descriptor.label();
    let total_expected = env.progress.total_expected();
    let writer = RefCell::new(StreamingWriter::new(&descriptor.destination, |n| {
        item_bytes.set(item_bytes.get() + n);
        let total = env.progress.add_bytes(n);
        env.observer
            .on_progress(total, total_expected, label.as_deref());
    }));
    let headers: RefCell<Vec<String>> = RefCell::new(Vec::new());
    let status_ok: Cell<Option<bool>> = Cell::new(None);
    let storage_error: RefCell<Option<TransferError>> = RefCell::new(None);
    let cancel = env.cancel;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(TransferError::Curl)?;
    env.transport.apply(&mut easy).map_err(TransferError::Curl)?;
    easy.timeout(env.item_timeout).map_err(TransferError::Curl)?;
    easy.progress(true).map_err(TransferError::Curl)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.borrow_mut().push(s.trim_end().to_string());
                }
                true
            })
            .map_err(TransferError::Curl)?;
        transfer
            .progress_function(|_, _, _, _| !cancel.is_cancelled())
            .map_err(TransferError::Curl)?;
        transfer
            .write_function(|data| {
                if cancel.is_cancelled() {
                    return Ok(0);
                }
                let ok = match status_ok.get() {
                    Some(ok) => ok,
                    None => {
                        let ok = parse::last_status(&headers.borrow())
                            .map(|code| (200..300).contains(&code))
                            .unwrap_or(false);
                        status_ok.set(Some(ok));
                        ok
                    }
                };
                if !ok {
                    return Ok(data.len());
                }
                match writer.borrow_mut().write_chunk(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        *storage_error.borrow_mut() = Some(e);
                        Ok(0)
                    }
                }
            })
            .map_err(TransferError::Curl)?;
        transfer.perform()
    };

    let writer = writer.into_inner();
    if let Err(e) = performed {
        let written = writer.abandon();
        tracing::debug!(url, written, error = %e, "transfer interrupted; partial file left as-is");
        if let Some(storage_err) = storage_error.into_inner() {
            return Err(storage_err);
        }
        if cancel.is_cancelled() && (e.is_aborted_by_callback() || e.is_write_error()) {
            return Err(TransferError::Cancelled);
        }
        return Err(TransferError::Curl(e));
    }

    let code = easy.response_code().map_err(TransferError::Curl)?;
    if !(200..300).contains(&code) {
        writer.abandon();
        return Err(TransferError::Http(code));
    }
    writer.finish()
}
