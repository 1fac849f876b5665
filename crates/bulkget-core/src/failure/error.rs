//! Low-level transfer error, captured before classification.

use std::fmt;

/// Error raised by one step of a transfer (curl failure, HTTP error, disk failure).
/// Kept unclassified so `classify` can inspect its nature in one place.
#[derive(Debug)]
pub enum TransferError {
    /// Curl reported an error (timeout, connection, callback abort, etc.).
    Curl(curl::Error),
    /// HTTP response had a non-2xx status.
    Http(u32),
    /// Stream ended with a different byte count than the descriptor announced.
    LengthMismatch { expected: u64, received: u64 },
    /// Destination directory could not be created.
    CreateDir(std::io::Error),
    /// Destination file could not be opened for write.
    Open(std::io::Error),
    /// Writing or flushing the destination file failed.
    Storage(std::io::Error),
    /// None of the mirror hosts answered the probe.
    NoMirror { path: String, tried: usize },
    /// The batch's cancel token was observed.
    Cancelled,
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::Curl(e) => write!(f, "{}", e),
            TransferError::Http(code) => write!(f, "HTTP {}", code),
            TransferError::LengthMismatch { expected, received } => {
                write!(f, "length mismatch: expected {} bytes, got {}", expected, received)
            }
            TransferError::CreateDir(e) => write!(f, "create dir: {}", e),
            TransferError::Open(e) => write!(f, "open: {}", e),
            TransferError::Storage(e) => write!(f, "storage: {}", e),
            TransferError::NoMirror { path, tried } => {
                write!(f, "no mirror answered for {} ({} tried)", path, tried)
            }
            TransferError::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Curl(e) => Some(e),
            TransferError::CreateDir(e) | TransferError::Open(e) | TransferError::Storage(e) => {
                Some(e)
            }
            TransferError::Http(_)
            | TransferError::LengthMismatch { .. }
            | TransferError::NoMirror { .. }
            | TransferError::Cancelled => None,
        }
    }
}
