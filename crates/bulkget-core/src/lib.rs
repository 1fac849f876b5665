//! Bulk asset downloads: many files, bounded concurrency, mirror fallback,
//! aggregate progress with smoothed speed and ETA.

pub mod config;
pub mod control;
pub mod descriptor;
pub mod failure;
pub mod logging;
pub mod probe;
pub mod scheduler;
pub mod storage;
pub mod throughput;

pub use config::{EngineConfig, TransportOptions};
pub use control::CancelToken;
pub use descriptor::{total_expected_bytes, Descriptor, DownloadSource};
pub use failure::{ClassifiedError, ErrorContext, ErrorKind, FsFailure};
pub use scheduler::{
    run_batch, run_batch_async, BatchEvent, BatchFailure, BatchObserver, BatchReport, Engine,
    NoopObserver,
};
pub use throughput::{Eta, ThroughputEstimator};
