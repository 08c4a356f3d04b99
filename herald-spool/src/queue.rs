//! The queue contract used by producers and the delivery worker.

use std::sync::Arc;

use herald_common::internal;

use crate::{
    SpoolError,
    record::{NewRecord, QueueRecord},
    r#trait::BackingStore,
    types::RecordId,
};

/// Result of scanning the active records
#[derive(Debug, Default)]
pub struct PendingScan {
    /// Readable records, oldest first
    pub records: Vec<QueueRecord>,
    /// Corrupt records that were deleted during the scan
    pub discarded: usize,
}

/// FIFO queue of records awaiting delivery
///
/// A thin layer over a [`BackingStore`] that owns the corrupt-record policy:
/// a record whose stored document cannot be decoded is logged and deleted
/// rather than retried, since no number of retries would make it readable.
#[derive(Debug, Clone)]
pub struct DurableQueue {
    store: Arc<dyn BackingStore>,
}

impl DurableQueue {
    #[must_use]
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    /// Store a new record under a fresh id.
    ///
    /// # Errors
    /// If the backing store rejects the write.
    pub async fn enqueue(&self, draft: NewRecord) -> crate::Result<QueueRecord> {
        let record = self.store.write(draft).await?;
        internal!(
            level = DEBUG,
            "Enqueued record {} for {} destinations",
            record.id(),
            record.target_chat_ids().len()
        );
        Ok(record)
    }

    /// All active records, oldest first.
    ///
    /// # Errors
    /// If the store cannot be listed or a record cannot be read for a reason
    /// other than corruption.
    pub async fn list_pending(&self) -> crate::Result<Vec<QueueRecord>> {
        Ok(self.scan_pending().await?.records)
    }

    /// Like [`Self::list_pending`], also reporting how many corrupt records
    /// were discarded along the way.
    ///
    /// # Errors
    /// See [`Self::list_pending`].
    pub async fn scan_pending(&self) -> crate::Result<PendingScan> {
        let mut scan = PendingScan::default();

        for id in self.store.list().await? {
            match self.store.read(&id).await {
                Ok(record) => scan.records.push(record),
                Err(err) if err.is_corrupt() => {
                    tracing::warn!(record_id = %id, error = %err, "Discarding corrupt record");
                    match self.store.delete(&id).await {
                        Ok(()) | Err(SpoolError::NotFound(_)) => scan.discarded += 1,
                        Err(err) => return Err(err),
                    }
                }
                Err(SpoolError::NotFound(_)) => {
                    internal!(level = DEBUG, "Record {id} disappeared while scanning");
                }
                Err(err) => return Err(err),
            }
        }

        Ok(scan)
    }

    /// Overwrite the stored version of `record`.
    ///
    /// # Errors
    /// If the record is no longer active or the write fails.
    pub async fn persist_update(&self, record: &QueueRecord) -> crate::Result<()> {
        self.store.update(record).await
    }

    /// Delete a fully delivered record.
    ///
    /// # Errors
    /// If the record is not active or cannot be deleted.
    pub async fn remove(&self, id: &RecordId) -> crate::Result<()> {
        self.store.delete(id).await
    }

    /// Move a record out of the active set for good.
    ///
    /// # Errors
    /// If the record is not active or cannot be moved.
    pub async fn quarantine(&self, id: &RecordId) -> crate::Result<()> {
        self.store.quarantine(id).await
    }

    /// Quarantined records, oldest first. Unreadable ones are skipped.
    ///
    /// # Errors
    /// If the dead-letter area cannot be listed.
    pub async fn list_quarantined(&self) -> crate::Result<Vec<QueueRecord>> {
        let mut records = Vec::new();

        for id in self.store.list_quarantined().await? {
            match self.store.read_quarantined(&id).await {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(record_id = %id, error = %err, "Skipping unreadable quarantined record");
                }
            }
        }

        Ok(records)
    }

    /// Read one quarantined record.
    ///
    /// # Errors
    /// If the record is not quarantined or cannot be decoded.
    pub async fn read_quarantined(&self, id: &RecordId) -> crate::Result<QueueRecord> {
        self.store.read_quarantined(id).await
    }
}
