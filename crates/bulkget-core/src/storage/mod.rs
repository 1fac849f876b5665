//! Disk side of a transfer.
//!
//! Creates destination directories and streams arriving body chunks into the
//! destination file. Partial files are never deleted here: cleanup policy
//! belongs to whoever owns the descriptor queue.

mod writer;

pub use writer::StreamingWriter;

use crate::failure::TransferError;
use std::path::Path;

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_dir(dir: &Path) -> Result<(), TransferError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(TransferError::CreateDir)
}
