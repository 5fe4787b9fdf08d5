//! Live progress reporting and cooperative cancellation for batches.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use super::retry::RetryNotice;

/// Where a document is in its ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentPhase {
    Pending,
    Reading,
    Extracting,
    /// Waiting out a rate limit before the next extraction attempt.
    Retrying,
    Validating,
    Stored,
    Failed,
    /// Never attempted: unsupported media type or batch cancelled.
    Skipped,
}

impl DocumentPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DocumentPhase::Stored | DocumentPhase::Failed | DocumentPhase::Skipped
        )
    }
}

impl fmt::Display for DocumentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentPhase::Pending => "pending",
            DocumentPhase::Reading => "reading",
            DocumentPhase::Extracting => "extracting",
            DocumentPhase::Retrying => "retrying",
            DocumentPhase::Validating => "validating",
            DocumentPhase::Stored => "stored",
            DocumentPhase::Failed => "failed",
            DocumentPhase::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Event emitted while a batch runs. `index` is 0-based.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
    },
    PhaseChanged {
        index: usize,
        total: usize,
        filename: String,
        phase: DocumentPhase,
    },
    RetryScheduled {
        index: usize,
        filename: String,
        notice: RetryNotice,
    },
    /// Pause before the document at `next_index`.
    CooldownStarted {
        next_index: usize,
        total: usize,
        wait: Duration,
    },
    DocumentFinished {
        index: usize,
        total: usize,
        filename: String,
        phase: DocumentPhase,
        /// User-facing failure description, when the document failed.
        error: Option<String>,
    },
    BatchFinished {
        succeeded: usize,
        total: usize,
    },
}

/// Receives progress events. Must return quickly; it runs inline with the batch.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Shared flag asking a running batch to stop at its next suspension point.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
