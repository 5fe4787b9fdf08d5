//! Sequential batch ingestion.
//!
//! Documents go through the oracle strictly one at a time with a fixed
//! cooldown between them; that pacing is what keeps a batch under the
//! oracle's request-rate ceiling. A failing document never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::progress::{CancellationFlag, DocumentPhase, ProgressEvent, ProgressObserver};
use super::retry::{RetryPolicy, RetryScheduler, Sleeper, TokioSleeper};
use crate::error::ExtractionError;
use crate::models::config::InvoicelyConfig;
use crate::models::document::DocumentSource;
use crate::models::invoice::{InvoiceRecord, generate_record_id};
use crate::oracle::{Credential, InvoiceOracle};
use crate::store::RecordStore;

/// Default pause between consecutive documents.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(6000);

/// Why a document did not make it into the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentFailure {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("failed to store record: {0}")]
    Store(String),
}

/// Why a document was never attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Neither an image nor a PDF.
    UnsupportedMediaType(String),
    /// The batch was cancelled before this document was stored.
    Cancelled,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedMediaType(mt) => write!(f, "unsupported media type: {mt}"),
            SkipReason::Cancelled => write!(f, "batch cancelled"),
        }
    }
}

/// Final state of one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    Stored(InvoiceRecord),
    Failed {
        filename: String,
        error: DocumentFailure,
    },
    Skipped {
        filename: String,
        reason: SkipReason,
    },
}

impl DocumentOutcome {
    pub fn filename(&self) -> &str {
        match self {
            DocumentOutcome::Stored(record) => &record.filename,
            DocumentOutcome::Failed { filename, .. } | DocumentOutcome::Skipped { filename, .. } => {
                filename
            }
        }
    }

    pub fn phase(&self) -> DocumentPhase {
        match self {
            DocumentOutcome::Stored(_) => DocumentPhase::Stored,
            DocumentOutcome::Failed { .. } => DocumentPhase::Failed,
            DocumentOutcome::Skipped { .. } => DocumentPhase::Skipped,
        }
    }

    pub fn record(&self) -> Option<&InvoiceRecord> {
        match self {
            DocumentOutcome::Stored(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, DocumentOutcome::Stored(_))
    }

    /// Description shown to the user for failed or skipped documents.
    pub fn error_message(&self) -> Option<String> {
        match self {
            DocumentOutcome::Stored(_) => None,
            DocumentOutcome::Failed { error, .. } => Some(error.to_string()),
            DocumentOutcome::Skipped { reason, .. } => Some(reason.to_string()),
        }
    }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl BatchSummary {
    /// Documents that actually went through reading/extraction.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Per-document outcomes, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match outcome {
                DocumentOutcome::Stored(_) => summary.succeeded += 1,
                DocumentOutcome::Failed { .. } => summary.failed += 1,
                DocumentOutcome::Skipped { .. } => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn succeeded(&self) -> usize {
        self.summary().succeeded
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Records stored by this batch, in input order.
    pub fn records(&self) -> impl Iterator<Item = &InvoiceRecord> {
        self.outcomes.iter().filter_map(DocumentOutcome::record)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| !o.is_stored())
    }
}

/// Turns uploaded documents into validated, stored invoice records.
pub struct IngestionPipeline<O, S> {
    oracle: O,
    store: S,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cooldown: Duration,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel: CancellationFlag,
}

impl<O: InvoiceOracle, S: RecordStore> IngestionPipeline<O, S> {
    pub fn new(oracle: O, store: S) -> Self {
        let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
        Self {
            oracle,
            store,
            retry: RetryPolicy::default(),
            sleeper,
            cooldown: DEFAULT_COOLDOWN,
            observer: None,
            cancel: CancellationFlag::new(),
        }
    }

    /// Pipeline with retry and cooldown settings from configuration.
    pub fn from_config(oracle: O, store: S, config: &InvoicelyConfig) -> Self {
        Self::new(oracle, store)
            .with_retry_policy(RetryPolicy::from(&config.retry))
            .with_cooldown(Duration::from_millis(config.batch.cooldown_ms))
    }

    /// Replace the wait primitive used for both backoff and cooldown.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Flag that stops the running batch at its next suspension point.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Ingest a batch, one document at a time.
    ///
    /// Takes `&mut self` so two batches can never share a pipeline (and its
    /// rate-limit budget) at the same time.
    pub async fn ingest(&mut self, documents: Vec<DocumentSource>, credential: &Credential) -> BatchResult {
        let total = documents.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut attempted = 0usize;

        info!(total, "Starting batch ingestion");
        self.emit(ProgressEvent::BatchStarted { total });

        if total > 0 && credential.is_missing() {
            warn!("No API key configured, no document will be sent to the oracle");
        }

        for (index, source) in documents.into_iter().enumerate() {
            let outcome = if !source.is_supported() {
                warn!(document = %source.filename, media_type = %source.media_type, "Rejected unsupported document");
                DocumentOutcome::Skipped {
                    filename: source.filename.clone(),
                    reason: SkipReason::UnsupportedMediaType(source.media_type.clone()),
                }
            } else if self.cancel.is_cancelled() {
                skipped_by_cancel(&source)
            } else if credential.is_missing() {
                DocumentOutcome::Failed {
                    filename: source.filename.clone(),
                    error: ExtractionError::MissingCredential.into(),
                }
            } else {
                if attempted > 0 {
                    self.emit(ProgressEvent::CooldownStarted {
                        next_index: index,
                        total,
                        wait: self.cooldown,
                    });
                    debug!(cooldown_ms = self.cooldown.as_millis() as u64, "Cooling down before next document");
                    self.sleeper.sleep(self.cooldown).await;
                }

                if self.cancel.is_cancelled() {
                    skipped_by_cancel(&source)
                } else {
                    attempted += 1;
                    self.process(index, total, &source, credential).await
                }
            };

            self.emit(ProgressEvent::DocumentFinished {
                index,
                total,
                filename: outcome.filename().to_string(),
                phase: outcome.phase(),
                error: outcome.error_message(),
            });
            outcomes.push(outcome);
        }

        let result = BatchResult { outcomes };
        let summary = result.summary();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            total,
            "Batch ingestion finished"
        );
        self.emit(ProgressEvent::BatchFinished {
            succeeded: summary.succeeded,
            total,
        });

        result
    }

    async fn process(
        &self,
        index: usize,
        total: usize,
        source: &DocumentSource,
        credential: &Credential,
    ) -> DocumentOutcome {
        let filename = source.filename.clone();
        let failed = |error: DocumentFailure| {
            warn!(document = %filename, error = %error, "Document failed");
            DocumentOutcome::Failed {
                filename: filename.clone(),
                error,
            }
        };

        self.phase(index, total, &filename, DocumentPhase::Reading);
        let document = match source.read().await {
            Ok(document) => document,
            Err(err) => return failed(err.into()),
        };

        if self.cancel.is_cancelled() {
            return skipped_by_cancel(source);
        }

        self.phase(index, total, &filename, DocumentPhase::Extracting);
        let scheduler = RetryScheduler::new(self.retry, self.sleeper.clone())
            .with_cancellation(self.cancel.clone());
        let extracted = scheduler
            .run(
                |attempt| {
                    if attempt > 0 {
                        self.phase(index, total, &filename, DocumentPhase::Extracting);
                    }
                    self.oracle.extract(&document, credential)
                },
                |notice| {
                    self.phase(index, total, &filename, DocumentPhase::Retrying);
                    self.emit(ProgressEvent::RetryScheduled {
                        index,
                        filename: filename.clone(),
                        notice,
                    });
                },
            )
            .await;
        drop(document);

        let fields = match extracted {
            Ok(fields) => fields,
            Err(ExtractionError::Cancelled) => {
                info!(document = %filename, "Cancelled during rate-limit backoff");
                return skipped_by_cancel(source);
            }
            Err(err) => return failed(err.into()),
        };

        self.phase(index, total, &filename, DocumentPhase::Validating);
        let record = InvoiceRecord::new(
            generate_record_id(),
            filename.clone(),
            Utc::now().timestamp_millis(),
            fields,
        );

        if let Err(err) = self.store.save(&record) {
            return failed(DocumentFailure::Store(err.to_string()));
        }

        info!(
            document = %filename,
            id = %record.id,
            status = %record.status,
            "Invoice stored"
        );
        DocumentOutcome::Stored(record)
    }

    fn phase(&self, index: usize, total: usize, filename: &str, phase: DocumentPhase) {
        self.emit(ProgressEvent::PhaseChanged {
            index,
            total,
            filename: filename.to_string(),
            phase,
        });
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

fn skipped_by_cancel(source: &DocumentSource) -> DocumentOutcome {
    DocumentOutcome::Skipped {
        filename: source.filename.clone(),
        reason: SkipReason::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::Mutex;

    use crate::models::invoice::{Currency, ExtractedFields, InvoiceStatus};
    use crate::oracle::ScriptedOracle;
    use crate::pipeline::retry::RecordingSleeper;
    use crate::store::MemoryStore;

    const KEY: &str = "test-key-0123456789";

    fn fields(subtotal: f64, tax: f64, total: f64) -> ExtractedFields {
        ExtractedFields {
            vendor_name: Some("ACME".to_string()),
            currency: Currency::Usd,
            subtotal,
            tax_rate: 20.0,
            tax_amount: tax,
            grand_total: total,
            ..Default::default()
        }
    }

    fn write_docs(dir: &Path, names: &[&str]) -> Vec<DocumentSource> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, b"content").unwrap();
                DocumentSource::from_path(path)
            })
            .collect()
    }

    fn pipeline(oracle: ScriptedOracle, sleeper: &RecordingSleeper) -> IngestionPipeline<ScriptedOracle, MemoryStore> {
        IngestionPipeline::new(oracle, MemoryStore::new()).with_sleeper(Arc::new(sleeper.clone()))
    }

    fn cooldowns(sleeper: &RecordingSleeper) -> usize {
        sleeper.waits().iter().filter(|w| **w == DEFAULT_COOLDOWN).count()
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(ScriptedOracle::new(fields(1.0, 0.0, 1.0)), &sleeper);

        let result = pipeline.ingest(Vec::new(), &Credential::new(KEY)).await;

        assert_eq!(result.summary(), BatchSummary::default());
        assert!(sleeper.waits().is_empty());
        assert_eq!(pipeline.oracle().call_count(), 0);
    }

    #[tokio::test]
    async fn test_middle_failure_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["one.pdf", "two.png", "three.jpg"]);
        let oracle = ScriptedOracle::new(fields(100.0, 20.0, 120.0))
            .script("two.png", [ExtractionError::Failed("malformed response".to_string())]);
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(oracle, &sleeper);

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;
        let summary = result.summary();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total, 3);
        assert!(matches!(
            &result.outcomes[1],
            DocumentOutcome::Failed { filename, error: DocumentFailure::Extraction(ExtractionError::Failed(_)) }
                if filename == "two.png"
        ));

        let ids: HashSet<_> = result.records().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 2);

        let stored = pipeline.store().list().unwrap();
        assert_eq!(stored.len(), 2);
        for record in &stored {
            assert!(ids.contains(&record.id));
            assert_eq!(record.id.len(), 8);
            assert_eq!(record.status, InvoiceStatus::Valid);
        }
        assert_eq!(pipeline.oracle().calls(), vec!["one.pdf", "two.png", "three.jpg"]);
    }

    #[tokio::test]
    async fn test_cooldown_between_documents_only() {
        for n in 1..=4usize {
            let dir = tempfile::tempdir().unwrap();
            let names: Vec<String> = (0..n).map(|i| format!("doc{i}.pdf")).collect();
            let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let docs = write_docs(dir.path(), &name_refs);

            let sleeper = RecordingSleeper::new();
            let mut pipeline = pipeline(ScriptedOracle::new(fields(1.0, 0.0, 1.0)), &sleeper);
            pipeline.ingest(docs, &Credential::new(KEY)).await;

            assert_eq!(sleeper.waits(), vec![DEFAULT_COOLDOWN; n - 1], "n = {n}");
        }
    }

    #[tokio::test]
    async fn test_cooldown_happens_after_failures_too() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf", "b.pdf"]);
        let oracle = ScriptedOracle::failing(ExtractionError::Failed("boom".to_string()));
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(oracle, &sleeper);

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        assert_eq!(result.summary().failed, 2);
        assert_eq!(cooldowns(&sleeper), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_backoff_inside_batch() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf", "b.pdf"]);
        let throttled = ExtractionError::RateLimited("429".to_string());
        let oracle = ScriptedOracle::new(fields(100.0, 20.0, 125.0))
            .script("a.pdf", [throttled.clone(), throttled]);
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(oracle, &sleeper);

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        assert_eq!(result.succeeded(), 2);
        assert_eq!(
            sleeper.waits(),
            vec![
                Duration::from_millis(5000),
                Duration::from_millis(10000),
                DEFAULT_COOLDOWN,
            ]
        );

        let record = result.records().next().unwrap();
        assert_eq!(record.status, InvoiceStatus::ReviewRequired);
        assert!(record.validation_message.as_deref().unwrap().contains("Diff: 5.00"));
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_fails_document() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf"]);
        let oracle = ScriptedOracle::failing(ExtractionError::RateLimited("429".to_string()));
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(oracle, &sleeper);

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        assert_eq!(result.summary().failed, 1);
        assert_eq!(pipeline.oracle().call_count(), 4);
        assert!(pipeline.store().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credential_fails_everything_without_calls() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf", "b.png"]);
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(ScriptedOracle::new(fields(1.0, 0.0, 1.0)), &sleeper);

        let result = pipeline.ingest(docs, &Credential::new("")).await;

        assert_eq!(result.summary().failed, 2);
        for outcome in &result.outcomes {
            assert!(matches!(
                outcome,
                DocumentOutcome::Failed { error: DocumentFailure::Extraction(ExtractionError::MissingCredential), .. }
            ));
        }
        assert_eq!(pipeline.oracle().call_count(), 0);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut docs = write_docs(dir.path(), &["ok.pdf"]);
        docs.insert(0, DocumentSource::from_path(dir.path().join("vanished.pdf")));
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(ScriptedOracle::new(fields(1.0, 0.0, 1.0)), &sleeper);

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        assert!(matches!(
            &result.outcomes[0],
            DocumentOutcome::Failed { error: DocumentFailure::Extraction(ExtractionError::ReadFailed { .. }), .. }
        ));
        assert!(result.outcomes[1].is_stored());
        assert_eq!(pipeline.oracle().calls(), vec!["ok.pdf"]);
        assert_eq!(cooldowns(&sleeper), 1);
    }

    #[tokio::test]
    async fn test_unsupported_media_type_is_skipped_without_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["notes.txt", "scan.pdf"]);
        let sleeper = RecordingSleeper::new();
        let mut pipeline = pipeline(ScriptedOracle::new(fields(1.0, 0.0, 1.0)), &sleeper);

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        assert!(matches!(
            &result.outcomes[0],
            DocumentOutcome::Skipped { reason: SkipReason::UnsupportedMediaType(mt), .. } if mt == "text/plain"
        ));
        assert_eq!(result.summary().attempted(), 1);
        assert_eq!(pipeline.oracle().calls(), vec!["scan.pdf"]);
        assert!(sleeper.waits().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_skips_remaining_documents() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf", "b.pdf", "c.pdf"]);
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationFlag::new();
        let trigger = cancel.clone();

        let mut pipeline = pipeline(ScriptedOracle::new(fields(1.0, 0.0, 1.0)), &sleeper)
            .with_cancellation(cancel)
            .with_observer(move |event: &ProgressEvent| {
                if let ProgressEvent::DocumentFinished { index: 0, .. } = event {
                    trigger.cancel();
                }
            });

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        assert!(result.outcomes[0].is_stored());
        for outcome in &result.outcomes[1..] {
            assert!(matches!(outcome, DocumentOutcome::Skipped { reason: SkipReason::Cancelled, .. }));
        }
        assert_eq!(pipeline.store().len(), 1);
        assert_eq!(pipeline.oracle().call_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_skips_document() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf", "b.pdf"]);
        let oracle = ScriptedOracle::new(fields(1.0, 0.0, 1.0))
            .script("a.pdf", [ExtractionError::RateLimited("429".to_string())]);
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationFlag::new();
        let trigger = cancel.clone();

        let mut pipeline = pipeline(oracle, &sleeper)
            .with_cancellation(cancel)
            .with_observer(move |event: &ProgressEvent| {
                if let ProgressEvent::RetryScheduled { .. } = event {
                    trigger.cancel();
                }
            });

        let result = pipeline.ingest(docs, &Credential::new(KEY)).await;

        for outcome in &result.outcomes {
            assert!(matches!(outcome, DocumentOutcome::Skipped { reason: SkipReason::Cancelled, .. }));
        }
        assert_eq!(pipeline.oracle().call_count(), 1);
        assert!(pipeline.store().is_empty());
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(5000)]);
    }

    #[tokio::test]
    async fn test_progress_events_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let docs = write_docs(dir.path(), &["a.pdf", "b.pdf"]);
        let oracle = ScriptedOracle::new(fields(1.0, 0.0, 1.0))
            .script("b.pdf", [ExtractionError::RateLimited("429".to_string())]);
        let sleeper = RecordingSleeper::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let mut pipeline = pipeline(oracle, &sleeper).with_observer(move |event: &ProgressEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        pipeline.ingest(docs, &Credential::new(KEY)).await;

        let events = events.lock().unwrap();
        assert_eq!(events.first(), Some(&ProgressEvent::BatchStarted { total: 2 }));
        assert_eq!(events.last(), Some(&ProgressEvent::BatchFinished { succeeded: 2, total: 2 }));

        let phases_of_b: Vec<DocumentPhase> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::PhaseChanged { index: 1, phase, .. } => Some(*phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases_of_b,
            vec![
                DocumentPhase::Reading,
                DocumentPhase::Extracting,
                DocumentPhase::Retrying,
                DocumentPhase::Extracting,
                DocumentPhase::Validating,
            ]
        );

        let cooldown_pos = events
            .iter()
            .position(|e| matches!(e, ProgressEvent::CooldownStarted { next_index: 1, .. }))
            .unwrap();
        let first_done = events
            .iter()
            .position(|e| matches!(e, ProgressEvent::DocumentFinished { index: 0, .. }))
            .unwrap();
        assert!(first_done < cooldown_pos);
    }
}
