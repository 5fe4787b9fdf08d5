//! Record store persisted as a single JSON array on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{RecordStore, Result, apply_update, sort_newest_first, validated};
use crate::error::StoreError;
use crate::models::invoice::InvoiceRecord;

/// Record store backed by one JSON file.
///
/// Each write loads, modifies and rewrites the whole collection under a lock,
/// going through a temporary file so a crash never leaves half a file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn load(&self) -> Result<Vec<InvoiceRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn persist(&self, records: &[InvoiceRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(records)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), count = records.len(), "Persisted records");
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Vec<InvoiceRecord>) -> T) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.load()?;
        let out = f(&mut records);
        self.persist(&records)?;
        Ok(out)
    }
}

impl RecordStore for JsonFileStore {
    fn save(&self, record: &InvoiceRecord) -> Result<()> {
        let record = validated(record);
        self.modify(|records| records.push(record))
    }

    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut records = self.load()?;
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn update(&self, record: InvoiceRecord) -> Result<Option<InvoiceRecord>> {
        self.modify(|records| apply_update(records, record))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|r| r.id != id);
            records.len() != before
        })
    }
}
