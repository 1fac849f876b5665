//! Metadata-only probing of remote resources and mirror selection.
//!
//! Uses the curl crate (libcurl) to issue a HEAD request and read
//! `Content-Length`. Mirror selection walks hosts in preference order and
//! stops at the first one that answers.

mod mirrors;
pub(crate) mod parse;

pub use mirrors::{mirror_url, probe_mirrors, ResolvedMirror};

use crate::config::TransportOptions;
use crate::control::CancelToken;
use crate::failure::{classify, ClassifiedError, ErrorContext, TransferError};
use std::str;
use std::time::Duration;

/// Metadata of a resource that answered a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteMeta {
    /// Advertised `Content-Length`, or 0 when the server sent none.
    pub content_length: u64,
}

/// Result of a completed probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered exactly HTTP 200.
    Found(RemoteMeta),
    /// The server answered, but with another status.
    NotFound(u32),
}

/// Performs a HEAD request bounded by `timeout`.
///
/// A non-200 answer is `Ok(ProbeOutcome::NotFound)`; transport failures
/// (timeout, refused connection, DNS) are classified errors.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn probe(
    url: &str,
    timeout: Duration,
    transport: &TransportOptions,
) -> Result<ProbeOutcome, ClassifiedError> {
    let context = ErrorContext::for_url(url).with_timeout(timeout);
    probe_raw(url, timeout, transport, None).map_err(|e| classify(&e, context))
}

/// Like [`probe`], but the request is aborted once `cancel` fires; the
/// result is then a `Cancelled` error.
pub fn probe_cancellable(
    url: &str,
    timeout: Duration,
    transport: &TransportOptions,
    cancel: &CancelToken,
) -> Result<ProbeOutcome, ClassifiedError> {
    let context = ErrorContext::for_url(url).with_timeout(timeout);
    probe_raw(url, timeout, transport, Some(cancel)).map_err(|e| classify(&e, context))
}

fn probe_raw(
    url: &str,
    timeout: Duration,
    transport: &TransportOptions,
    cancel: Option<&CancelToken>,
) -> Result<ProbeOutcome, TransferError> {
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(TransferError::Cancelled);
    }
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(TransferError::Curl)?;
    easy.nobody(true).map_err(TransferError::Curl)?; // HEAD request
    transport.apply(&mut easy).map_err(TransferError::Curl)?;
    easy.timeout(timeout).map_err(TransferError::Curl)?;
    if cancel.is_some() {
        easy.progress(true).map_err(TransferError::Curl)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(TransferError::Curl)?;
        if let Some(cancel) = cancel {
            transfer
                .progress_function(|_, _, _, _| !cancel.is_cancelled())
                .map_err(TransferError::Curl)?;
        }
        transfer.perform().map_err(TransferError::Curl)?;
    }

    let code = easy.response_code().map_err(TransferError::Curl)?;
    if code != 200 {
        tracing::debug!(url, code, "probe answered without 200");
        return Ok(ProbeOutcome::NotFound(code));
    }

    Ok(ProbeOutcome::Found(RemoteMeta {
        content_length: parse::content_length(&headers).unwrap_or(0),
    }))
}
