//! Uploaded documents: where they come from and what they contain.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Kind of document the oracle accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Any `image/*` media type.
    Image,
    /// `application/pdf`.
    Pdf,
}

impl MediaKind {
    /// Classify a declared media type; `None` for anything we don't upload.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let media_type = media_type.trim().to_ascii_lowercase();
        if media_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else if media_type == "application/pdf" {
            Some(MediaKind::Pdf)
        } else {
            None
        }
    }
}

/// A document waiting to be ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    /// Location of the content on disk.
    pub path: PathBuf,

    /// Name shown to the user and stored on the record.
    pub filename: String,

    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
}

impl DocumentSource {
    /// Describe a file, guessing its media type from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let media_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            path,
            filename,
            media_type,
        }
    }

    /// Describe a file with an explicitly declared media type.
    pub fn new(path: impl Into<PathBuf>, media_type: impl Into<String>) -> Self {
        let mut source = Self::from_path(path);
        source.media_type = media_type.into();
        source
    }

    pub fn media_kind(&self) -> Option<MediaKind> {
        MediaKind::from_media_type(&self.media_type)
    }

    pub fn is_supported(&self) -> bool {
        self.media_kind().is_some()
    }

    /// Load the full content.
    pub async fn read(&self) -> Result<RawDocument, ExtractionError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ExtractionError::ReadFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(RawDocument {
            filename: self.filename.clone(),
            media_type: self.media_type.clone(),
            bytes,
        })
    }
}

/// Document content in memory, alive only for one extraction.
#[derive(Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }
}

impl std::fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawDocument")
            .field("filename", &self.filename)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Keep only files the oracle can take (images and PDFs).
pub fn supported_sources<I, P>(paths: I) -> Vec<DocumentSource>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .map(|p| DocumentSource::from_path(p.as_ref()))
        .filter(DocumentSource::is_supported)
        .collect()
}
