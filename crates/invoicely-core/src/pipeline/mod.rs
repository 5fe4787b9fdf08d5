//! Batch ingestion: documents in, validated records out.
//!
//! [`IngestionPipeline`] walks a batch one document at a time, retrying
//! rate-limited extractions through a [`RetryScheduler`] and pacing documents
//! with a fixed cooldown. Observers see every phase change as it happens.

mod batch;
mod progress;
mod retry;

pub use batch::{
    BatchResult, BatchSummary, DEFAULT_COOLDOWN, DocumentFailure, DocumentOutcome, IngestionPipeline,
    SkipReason,
};
pub use progress::{CancellationFlag, DocumentPhase, ProgressEvent, ProgressObserver};
pub use retry::{RecordingSleeper, RetryNotice, RetryPolicy, RetryScheduler, Sleeper, TokioSleeper};
