//! Download descriptors: what to fetch and where to put it.
//!
//! Descriptors come from whoever resolved the work (a manifest or catalog
//! resolver) and are never mutated by the engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadSource {
    /// A single absolute URL.
    Direct(String),
    /// A relative resource path served by any of `hosts`, ranked by preference.
    Mirrored { path: String, hosts: Vec<String> },
}

/// One file to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub source: DownloadSource,
    /// Final path of the file.
    pub destination: PathBuf,
    /// Directory created before the transfer starts.
    pub folder: PathBuf,
    /// Expected byte length, if the resolver knows it.
    #[serde(default)]
    pub expected_len: Option<u64>,
    /// Optional tag used to label progress (e.g. "library", "asset").
    #[serde(default)]
    pub kind: Option<String>,
}

impl Descriptor {
    /// Descriptor for a direct URL; the folder is the destination's parent.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self::with_source(DownloadSource::Direct(url.into()), destination.into())
    }

    /// Descriptor resolved through mirror probing at transfer time.
    pub fn mirrored(
        path: impl Into<String>,
        hosts: Vec<String>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::with_source(
            DownloadSource::Mirrored {
                path: path.into(),
                hosts,
            },
            destination.into(),
        )
    }

    fn with_source(source: DownloadSource, destination: PathBuf) -> Self {
        let folder = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            source,
            destination,
            folder,
            expected_len: None,
            kind: None,
        }
    }

    pub fn expected_len(mut self, len: u64) -> Self {
        self.expected_len = Some(len);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Label for progress events: the kind tag, else the file name.
    pub fn label(&self) -> Option<String> {
        self.kind.clone().or_else(|| {
            self.destination
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
    }

    /// URL or relative path, for logs and error context.
    pub fn source_display(&self) -> &str {
        match &self.source {
            DownloadSource::Direct(url) => url,
            DownloadSource::Mirrored { path, .. } => path,
        }
    }
}

/// Sum of the known lengths, for callers that want the engine's own total.
pub fn total_expected_bytes(descriptors: &[Descriptor]) -> u64 {
    descriptors.iter().filter_map(|d| d.expected_len).sum()
}
