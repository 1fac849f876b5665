//! Classified error type shared by every engine component.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filesystem sub-cases carried by `ErrorKind::Filesystem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFailure {
    /// Destination directory could not be created.
    CreateDir,
    /// Destination file could not be opened for write.
    Open,
    /// No space left on the device.
    DiskFull,
    /// The process lacks permission for the path.
    PermissionDenied,
    /// Any other write/flush failure.
    Write,
}

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure (connection refused/reset, DNS, mid-stream drop).
    Connection,
    /// The request did not finish within its timeout.
    Timeout,
    /// Server answered with a non-success status (see `ErrorContext::status`).
    HttpStatus,
    /// Local disk failure.
    Filesystem(FsFailure),
    /// Data arrived but does not match what was expected (e.g. length).
    Validation,
    /// Batch was cancelled by the caller.
    Cancelled,
    /// Failure that matched nothing above; carries the original message.
    Other,
}

impl ErrorKind {
    /// Default recoverability for this kind. `HttpStatus` depends on the code,
    /// see [`ClassifiedError::http_status`].
    pub fn default_recoverable(self) -> bool {
        match self {
            ErrorKind::Connection | ErrorKind::Timeout | ErrorKind::Validation => true,
            ErrorKind::HttpStatus => true,
            ErrorKind::Filesystem(_) | ErrorKind::Cancelled | ErrorKind::Other => false,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Connection => write!(f, "connection failure"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::HttpStatus => write!(f, "http status failure"),
            ErrorKind::Filesystem(FsFailure::CreateDir) => write!(f, "filesystem failure (create dir)"),
            ErrorKind::Filesystem(FsFailure::Open) => write!(f, "filesystem failure (open)"),
            ErrorKind::Filesystem(FsFailure::DiskFull) => write!(f, "filesystem failure (disk full)"),
            ErrorKind::Filesystem(FsFailure::PermissionDenied) => {
                write!(f, "filesystem failure (permission denied)")
            }
            ErrorKind::Filesystem(FsFailure::Write) => write!(f, "filesystem failure (write)"),
            ErrorKind::Validation => write!(f, "validation failure"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
            ErrorKind::Other => write!(f, "unclassified failure"),
        }
    }
}

/// Structured context attached to a classified error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub url: Option<String>,
    pub path: Option<PathBuf>,
    pub status: Option<u16>,
    pub timeout: Option<Duration>,
    /// Position of the failing descriptor in its batch.
    pub index: Option<usize>,
}

impl ErrorContext {
    pub fn for_url(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A failure that has been mapped onto the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    pub recoverable: bool,
    pub context: ErrorContext,
}

impl ClassifiedError {
    /// Build an error with the kind's default recoverability.
    pub fn new(kind: ErrorKind, message: impl Into<String>, context: ErrorContext) -> Self {
        Self {
            kind,
            message: message.into(),
            recoverable: kind.default_recoverable(),
            context,
        }
    }

    /// HTTP status failure. Client errors (400..500) are not recoverable.
    pub fn http_status(status: u16, context: ErrorContext) -> Self {
        let recoverable = !(400..500).contains(&status);
        Self {
            kind: ErrorKind::HttpStatus,
            message: format!("server returned HTTP {status}"),
            recoverable,
            context: ErrorContext {
                status: Some(status),
                ..context
            },
        }
    }

    pub fn cancelled(context: ErrorContext) -> Self {
        Self::new(ErrorKind::Cancelled, "batch cancelled", context)
    }

    /// Override the kind's default recoverability.
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.context.index = Some(index);
        self
    }
}
