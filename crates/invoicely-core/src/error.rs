//! Error types for the invoicely-core library.

use thiserror::Error;

/// Main error type for the invoicely library.
#[derive(Error, Debug)]
pub enum InvoicelyError {
    /// Document extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Record store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// CSV export error.
    #[error("export error: {0}")]
    Export(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures of a single document on its way through the oracle.
///
/// The retry scheduler only looks at the variant, never at the message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No credential was supplied, so no call was made.
    #[error("API key is missing, provide a Gemini API key")]
    MissingCredential,

    /// The oracle throttled the request (HTTP 429 / RESOURCE_EXHAUSTED).
    #[error("rate limited by oracle: {0}")]
    RateLimited(String),

    /// Any other oracle-side failure, including malformed or empty responses.
    #[error("extraction failed: {0}")]
    Failed(String),

    /// The document content could not be read from disk.
    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    /// The batch was cancelled while waiting to retry.
    #[error("cancelled while waiting to retry")]
    Cancelled,
}

impl ExtractionError {
    /// Whether the retry scheduler may back off and try again.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ExtractionError::RateLimited(_))
    }
}

/// Errors related to record persistence.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backing file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored collection is not valid JSON.
    #[error("failed to (de)serialize records: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another writer panicked while holding the store lock.
    #[error("record store lock poisoned")]
    Poisoned,
}

/// Result type for the invoicely library.
pub type Result<T> = std::result::Result<T, InvoicelyError>;
