//! Persistence for invoice records.
//!
//! Stores keep one flat collection scanned linearly by id. Insertion order is
//! irrelevant: [`RecordStore::list`] always returns newest uploads first.
//! Every write re-derives status from the arithmetic check, so a stored record
//! never carries a hand-set status.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::invoice::InvoiceRecord;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Append/lookup/update/delete persistence for invoice records.
///
/// Implementations serialize their own writes.
pub trait RecordStore: Send + Sync {
    /// Append a record; its status is re-derived from the numbers first.
    fn save(&self, record: &InvoiceRecord) -> Result<()>;

    /// All records, newest upload first.
    fn list(&self) -> Result<Vec<InvoiceRecord>>;

    /// Look up a record by id.
    fn get(&self, id: &str) -> Result<Option<InvoiceRecord>> {
        Ok(self.list()?.into_iter().find(|r| r.id == id))
    }

    /// Overwrite the record with the same id, re-validating its arithmetic.
    ///
    /// Returns the stored version, or `None` when no record has that id.
    fn update(&self, record: InvoiceRecord) -> Result<Option<InvoiceRecord>>;

    /// Remove a record; returns whether anything was removed.
    fn delete(&self, id: &str) -> Result<bool>;
}

impl<T: RecordStore + ?Sized> RecordStore for std::sync::Arc<T> {
    fn save(&self, record: &InvoiceRecord) -> Result<()> {
        (**self).save(record)
    }

    fn list(&self) -> Result<Vec<InvoiceRecord>> {
        (**self).list()
    }

    fn get(&self, id: &str) -> Result<Option<InvoiceRecord>> {
        (**self).get(id)
    }

    fn update(&self, record: InvoiceRecord) -> Result<Option<InvoiceRecord>> {
        (**self).update(record)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        (**self).delete(id)
    }
}

/// Sort newest upload first; ties keep their relative order.
pub(crate) fn sort_newest_first(records: &mut [InvoiceRecord]) {
    records.sort_by(|a, b| b.upload_timestamp.cmp(&a.upload_timestamp));
}

/// Copy of `record` with status and message derived from its numbers.
pub(crate) fn validated(record: &InvoiceRecord) -> InvoiceRecord {
    let mut record = record.clone();
    record.revalidate();
    record
}

/// Replace the record with a matching id, returning the re-validated copy.
pub(crate) fn apply_update(
    records: &mut [InvoiceRecord],
    mut record: InvoiceRecord,
) -> Option<InvoiceRecord> {
    let slot = records.iter_mut().find(|r| r.id == record.id)?;
    record.revalidate();
    *slot = record.clone();
    Some(record)
}
