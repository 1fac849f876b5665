//! Map low-level transfer errors onto the failure taxonomy.

use std::io;

use super::error::TransferError;
use super::kind::{ClassifiedError, ErrorContext, ErrorKind, FsFailure};

/// Classify a transfer error. Total: every input yields a `ClassifiedError`;
/// anything unmatched lands in `ErrorKind::Other` with the original message.
pub fn classify(e: &TransferError, context: ErrorContext) -> ClassifiedError {
    let message = e.to_string();
    match e {
        TransferError::Curl(ce) => {
            let kind = classify_curl_error(ce);
            ClassifiedError::new(kind, message, context)
        }
        TransferError::Http(code) => {
            let status = u16::try_from(*code).unwrap_or(u16::MAX);
            classify_http_status(status, context)
        }
        TransferError::LengthMismatch { .. } => {
            ClassifiedError::new(ErrorKind::Validation, message, context)
        }
        TransferError::CreateDir(io_err) => {
            let sub = match classify_io_error(io_err) {
                FsFailure::DiskFull => FsFailure::DiskFull,
                _ => FsFailure::CreateDir,
            };
            ClassifiedError::new(ErrorKind::Filesystem(sub), message, context)
        }
        TransferError::Open(io_err) => {
            let sub = match classify_io_error(io_err) {
                FsFailure::Write => FsFailure::Open,
                other => other,
            };
            ClassifiedError::new(ErrorKind::Filesystem(sub), message, context)
        }
        TransferError::Storage(io_err) => ClassifiedError::new(
            ErrorKind::Filesystem(classify_io_error(io_err)),
            message,
            context,
        ),
        TransferError::NoMirror { .. } => {
            ClassifiedError::new(ErrorKind::Connection, message, context)
        }
        TransferError::Cancelled => ClassifiedError::cancelled(context),
    }
}

/// Classify an HTTP status code. 4xx is fatal (the resource does not exist or
/// is forbidden); anything else non-2xx is worth another attempt.
pub fn classify_http_status(status: u16, context: ErrorContext) -> ClassifiedError {
    ClassifiedError::http_status(status, context)
}

/// Classify a curl error by its nature.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_aborted_by_callback() {
        return ErrorKind::Cancelled;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
        || e.is_ssl_connect_error()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a disk-side io error into a filesystem sub-case.
pub fn classify_io_error(e: &io::Error) -> FsFailure {
    #[cfg(unix)]
    {
        if e.raw_os_error() == Some(libc::ENOSPC) {
            return FsFailure::DiskFull;
        }
    }
    match e.kind() {
        io::ErrorKind::StorageFull => FsFailure::DiskFull,
        io::ErrorKind::PermissionDenied => FsFailure::PermissionDenied,
        _ => FsFailure::Write,
    }
}
