//! Batch scheduler.
//!
//! Runs a list of descriptors through a bounded pool of transfer workers:
//! optional mirror probe → streaming GET → disk. Aggregate progress is shared
//! by all transfers; an estimator thread turns it into speed and ETA events.

mod engine;
mod events;
mod outcome;
mod progress;
mod run;
mod ticker;
mod transfer;

pub use engine::{run_batch_async, Engine};
pub use events::{BatchEvent, BatchObserver, NoopObserver};
pub use outcome::{BatchFailure, BatchReport, ItemFailure};
pub use progress::{AggregateProgress, ProgressSnapshot};
pub use run::{effective_concurrency, run_batch};
pub use transfer::TransferStatus;
