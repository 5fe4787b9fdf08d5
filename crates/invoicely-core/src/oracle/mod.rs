//! Document-understanding oracle boundary.
//!
//! The oracle turns a document into [`ExtractedFields`]. Failures come back as
//! typed [`ExtractionError`] variants so callers never inspect message text:
//!
//! - `MissingCredential` - no call was made
//! - `RateLimited` - throttled, safe to back off and retry
//! - `Failed` - anything else, not retried
//!
//! [`GeminiClient`] talks to Google's Generative Language API; [`ScriptedOracle`]
//! replays canned outcomes for tests.

mod gemini;
mod mock;
mod schema;

pub use gemini::GeminiClient;
pub use mock::{ScriptedOracle, ScriptedOutcome};
pub use schema::{EXTRACTION_PROMPT, REQUIRED_FIELDS, response_schema};

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ExtractionError;
use crate::models::document::RawDocument;
use crate::models::invoice::ExtractedFields;

/// Shortest credential worth sending to the oracle.
pub const MIN_CREDENTIAL_LEN: usize = 10;

/// Secret authorizing oracle calls.
///
/// Passed explicitly to each batch; never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Credential from an optional configured value; absent becomes blank.
    pub fn from_option(secret: Option<String>) -> Self {
        Self(secret.unwrap_or_default())
    }

    pub fn is_missing(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn expose(&self) -> &str {
        self.0.trim()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            f.write_str("Credential(<missing>)")
        } else {
            f.write_str("Credential([REDACTED])")
        }
    }
}

/// Why a credential was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CredentialProblem {
    /// Shorter than [`MIN_CREDENTIAL_LEN`]; the oracle was not called.
    TooShort,
    /// The service refused the key.
    Rejected,
    /// The key works but its quota is used up.
    QuotaExhausted,
    /// Anything else, with the service's message.
    Other(String),
}

impl fmt::Display for CredentialProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialProblem::TooShort => write!(f, "API key is too short"),
            CredentialProblem::Rejected => {
                write!(f, "API key is not valid, make sure you entered the right key")
            }
            CredentialProblem::QuotaExhausted => {
                write!(f, "API quota is exhausted, try another key")
            }
            CredentialProblem::Other(msg) => write!(f, "API key could not be verified: {}", msg),
        }
    }
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<CredentialProblem>,
}

impl CredentialCheck {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            problem: None,
        }
    }

    pub fn rejected(problem: CredentialProblem) -> Self {
        Self {
            valid: false,
            problem: Some(problem),
        }
    }

    /// Human-readable reason, if the check failed.
    pub fn reason(&self) -> Option<String> {
        self.problem.as_ref().map(ToString::to_string)
    }
}

/// Trait for document-understanding oracles.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait InvoiceOracle: Send + Sync {
    /// Extract invoice fields from a document.
    async fn extract(
        &self,
        document: &RawDocument,
        credential: &Credential,
    ) -> Result<ExtractedFields, ExtractionError>;

    /// Confirm the credential is well-formed and accepted by the service.
    async fn check_credential(&self, credential: &Credential) -> CredentialCheck;
}

#[async_trait]
impl<T: InvoiceOracle + ?Sized> InvoiceOracle for std::sync::Arc<T> {
    async fn extract(
        &self,
        document: &RawDocument,
        credential: &Credential,
    ) -> Result<ExtractedFields, ExtractionError> {
        (**self).extract(document, credential).await
    }

    async fn check_credential(&self, credential: &Credential) -> CredentialCheck {
        (**self).check_credential(credential).await
    }
}
