//! Core library for invoice ingestion.
//!
//! This crate provides:
//! - A document-understanding oracle boundary with a Gemini client
//! - Rate-limit aware, sequential batch ingestion
//! - Arithmetic validation of extracted totals
//! - Record storage, CSV export and dashboard statistics

pub mod error;
pub mod invoice;
pub mod models;
pub mod oracle;
pub mod pipeline;
pub mod store;

pub use error::{ExtractionError, InvoicelyError, Result, StoreError};
pub use invoice::{DashboardStats, Validation, export_filename, records_to_csv, validate};
pub use models::config::InvoicelyConfig;
pub use models::document::{DocumentSource, RawDocument, supported_sources};
pub use models::invoice::{Currency, ExtractedFields, InvoiceRecord, InvoiceStatus};
pub use oracle::{Credential, CredentialCheck, CredentialProblem, GeminiClient, InvoiceOracle};
pub use pipeline::{
    BatchResult, CancellationFlag, DocumentOutcome, DocumentPhase, IngestionPipeline, ProgressEvent,
    ProgressObserver,
};
pub use store::{JsonFileStore, MemoryStore, RecordStore};
