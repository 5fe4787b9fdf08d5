//! Scripted oracle for tests and dry runs.
//!
//! WARNING: Never talks to a real service - outcomes are replayed from a script.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Credential, CredentialCheck, CredentialProblem, InvoiceOracle};
use crate::error::ExtractionError;
use crate::models::document::RawDocument;
use crate::models::invoice::ExtractedFields;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Fields(ExtractedFields),
    Error(ExtractionError),
}

impl From<ExtractedFields> for ScriptedOutcome {
    fn from(fields: ExtractedFields) -> Self {
        ScriptedOutcome::Fields(fields)
    }
}

impl From<ExtractionError> for ScriptedOutcome {
    fn from(err: ExtractionError) -> Self {
        ScriptedOutcome::Error(err)
    }
}

/// Oracle that replays per-document outcomes.
///
/// Each filename has a queue; once it runs dry the default outcome is used.
pub struct ScriptedOracle {
    default: ScriptedOutcome,
    scripts: Mutex<HashMap<String, VecDeque<ScriptedOutcome>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    /// Oracle answering every document with `fields`.
    pub fn new(fields: ExtractedFields) -> Self {
        Self {
            default: ScriptedOutcome::Fields(fields),
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Oracle failing every document with `err` unless scripted otherwise.
    pub fn failing(err: ExtractionError) -> Self {
        let mut oracle = Self::new(ExtractedFields::default());
        oracle.default = ScriptedOutcome::Error(err);
        oracle
    }

    /// Queue outcomes for one document, consumed in order.
    pub fn script<I, O>(self, filename: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<ScriptedOutcome>,
    {
        self.lock_scripts()
            .entry(filename.into())
            .or_default()
            .extend(outcomes.into_iter().map(Into::into));
        self
    }

    /// Filenames in the order extraction was requested.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<ScriptedOutcome>>> {
        self.scripts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl InvoiceOracle for ScriptedOracle {
    async fn extract(
        &self,
        document: &RawDocument,
        credential: &Credential,
    ) -> Result<ExtractedFields, ExtractionError> {
        if credential.is_missing() {
            return Err(ExtractionError::MissingCredential);
        }

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(document.filename.clone());
        }

        let outcome = self
            .lock_scripts()
            .get_mut(&document.filename)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default.clone());

        match outcome {
            ScriptedOutcome::Fields(fields) => Ok(fields),
            ScriptedOutcome::Error(err) => Err(err),
        }
    }

    async fn check_credential(&self, credential: &Credential) -> CredentialCheck {
        if credential.is_missing() {
            CredentialCheck::rejected(CredentialProblem::TooShort)
        } else {
            CredentialCheck::accepted()
        }
    }
}
