//! In-memory record store.

use std::sync::{Mutex, MutexGuard};

use super::{RecordStore, Result, apply_update, sort_newest_first, validated};
use crate::error::StoreError;
use crate::models::invoice::InvoiceRecord;

/// Record store backed by a vector; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<InvoiceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<InvoiceRecord>>> {
        self.records.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for MemoryStore {
    fn save(&self, record: &InvoiceRecord) -> Result<()> {
        self.lock()?.push(validated(record));
        Ok(())
    }

    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        let mut records = self.lock()?.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    fn update(&self, record: InvoiceRecord) -> Result<Option<InvoiceRecord>> {
        Ok(apply_update(&mut self.lock()?, record))
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }
}
