//! Failure taxonomy for transfers.
//!
//! Every failure inside the engine is captured as a low-level `TransferError`
//! (curl, HTTP status, disk) and mapped once by `classify` into a
//! `ClassifiedError`. Only classified errors cross the engine boundary.

mod classify;
mod error;
mod kind;

pub use classify::{classify, classify_curl_error, classify_http_status, classify_io_error};
pub use error::TransferError;
pub use kind::{ClassifiedError, ErrorContext, ErrorKind, FsFailure};
