//! Sequential writer for one destination file.

use crate::failure::TransferError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

enum FileState {
    /// No chunk has arrived yet; the file is opened on first use.
    Pending,
    Open(BufWriter<File>),
    /// A write failed and the handle was dropped.
    Released,
}

/// Appends body chunks to a destination file and reports each chunk's length
/// to `on_chunk` after it has been written.
///
/// The file is created lazily, so a response that never delivers a body chunk
/// (e.g. an error status) leaves nothing on disk. On a write failure the
/// handle is released immediately and every later call fails; retrying is
/// the caller's job.
pub struct StreamingWriter<F: FnMut(u64)> {
    path: PathBuf,
    state: FileState,
    written: u64,
    on_chunk: F,
}

impl<F: FnMut(u64)> StreamingWriter<F> {
    pub fn new(path: &Path, on_chunk: F) -> Self {
        Self {
            path: path.to_path_buf(),
            state: FileState::Pending,
            written: 0,
            on_chunk,
        }
    }

    fn file(&mut self) -> Result<&mut BufWriter<File>, TransferError> {
        if let FileState::Pending = self.state {
            let file = File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .map_err(TransferError::Open)?;
            self.state = FileState::Open(BufWriter::new(file));
        }
        match self.state {
            FileState::Open(ref mut w) => Ok(w),
            _ => Err(released()),
        }
    }

    /// Append one chunk and report its length.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), TransferError> {
        let result = match self.file() {
            Ok(w) => w.write_all(data).map_err(TransferError::Storage),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.state = FileState::Released;
            return Err(e);
        }
        self.written += data.len() as u64;
        (self.on_chunk)(data.len() as u64);
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush, sync and close the file. Consumes the writer so completion is
    /// signalled exactly once. An empty body still produces an empty file.
    pub fn finish(mut self) -> Result<u64, TransferError> {
        let written = self.written;
        let w = self.file()?;
        w.flush().map_err(TransferError::Storage)?;
        w.get_ref().sync_all().map_err(TransferError::Storage)?;
        self.state = FileState::Released;
        Ok(written)
    }

    /// Stop without finalizing. Whatever was written stays on disk as-is.
    pub fn abandon(mut self) -> u64 {
        if let FileState::Open(ref mut w) = self.state {
            if let Err(e) = w.flush() {
                tracing::debug!(path = %self.path.display(), error = %e, "flush of abandoned file failed");
            }
        }
        self.written
    }
}

fn released() -> TransferError {
    TransferError::Storage(std::io::Error::new(
        std::io::ErrorKind::Other,
        "file handle released after a failed write",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_are_appended_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut reported = Vec::new();
        let mut w = StreamingWriter::new(&path, |n| reported.push(n));
        w.write_chunk(b"hello ").unwrap();
        w.write_chunk(b"world").unwrap();
        assert_eq!(w.written(), 11);
        assert_eq!(w.finish().unwrap(), 11);
        assert_eq!(reported, vec![6, 5]);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn file_is_created_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lazy.bin");
        let w = StreamingWriter::new(&path, |_| {});
        assert!(!path.exists());
        assert_eq!(w.abandon(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn empty_body_finishes_as_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        let w = StreamingWriter::new(&path, |_| {});
        assert_eq!(w.finish().unwrap(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn open_failure_releases_handle() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for writing.
        let mut calls = 0;
        let mut w = StreamingWriter::new(dir.path(), |_| calls += 1);
        assert!(matches!(w.write_chunk(b"x"), Err(TransferError::Open(_))));
        assert!(matches!(w.write_chunk(b"y"), Err(TransferError::Storage(_))));
        assert!(w.finish().is_err());
        assert_eq!(calls, 0);
    }

    #[test]
    fn abandoned_file_keeps_partial_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");
        let mut w = StreamingWriter::new(&path, |_| {});
        w.write_chunk(&[7u8; 100]).unwrap();
        assert_eq!(w.abandon(), 100);
        assert_eq!(std::fs::read(&path).unwrap().len(), 100);
    }
}
