use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    SpoolError,
    record::{NewRecord, QueueRecord},
    r#trait::BackingStore,
    types::RecordId,
};

/// In-memory backing store implementation
///
/// Records are kept in their encoded form, exactly as the file store would
/// write them, so reads go through the same decoding and validation.
///
/// # Capacity Management
/// The store can be configured with a maximum number of active records.
/// Once reached, `write` fails with [`SpoolError::CapacityExceeded`] until a
/// record is removed or quarantined.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackingStore {
    pub(crate) records: Arc<DashMap<RecordId, Vec<u8>>>,
    pub(crate) quarantined: Arc<DashMap<RecordId, Vec<u8>>>,
    /// Maximum number of active records (None = unlimited)
    capacity: Option<usize>,
}

impl MemoryBackingStore {
    /// Create a new empty store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new store that holds at most `capacity` active records
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Number of active records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn sorted_ids(map: &DashMap<RecordId, Vec<u8>>) -> Vec<RecordId> {
        let mut ids: Vec<_> = map.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn decode(map: &DashMap<RecordId, Vec<u8>>, id: &RecordId) -> crate::Result<QueueRecord> {
        let bytes = map
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(SpoolError::NotFound(*id))?;

        Ok(QueueRecord::from_json(*id, &bytes)?)
    }
}

#[async_trait]
impl BackingStore for MemoryBackingStore {
    async fn write(&self, draft: NewRecord) -> crate::Result<QueueRecord> {
        if let Some(capacity) = self.capacity
            && self.records.len() >= capacity
        {
            return Err(SpoolError::CapacityExceeded(capacity));
        }

        let record = QueueRecord::create(RecordId::generate(), draft, Utc::now());
        let bytes = record.to_json()?;

        match self.records.entry(record.id()) {
            Entry::Occupied(_) => return Err(SpoolError::AlreadyExists(record.id())),
            Entry::Vacant(slot) => {
                slot.insert(bytes);
            }
        }

        Ok(record)
    }

    async fn list(&self) -> crate::Result<Vec<RecordId>> {
        Ok(Self::sorted_ids(&self.records))
    }

    async fn read(&self, id: &RecordId) -> crate::Result<QueueRecord> {
        Self::decode(&self.records, id)
    }

    async fn update(&self, record: &QueueRecord) -> crate::Result<()> {
        let bytes = record.to_json()?;
        let mut entry = self
            .records
            .get_mut(&record.id())
            .ok_or(SpoolError::NotFound(record.id()))?;
        *entry = bytes;
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> crate::Result<()> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or(SpoolError::NotFound(*id))
    }

    async fn quarantine(&self, id: &RecordId) -> crate::Result<()> {
        let (id, bytes) = self.records.remove(id).ok_or(SpoolError::NotFound(*id))?;
        self.quarantined.insert(id, bytes);
        Ok(())
    }

    async fn list_quarantined(&self) -> crate::Result<Vec<RecordId>> {
        Ok(Self::sorted_ids(&self.quarantined))
    }

    async fn read_quarantined(&self, id: &RecordId) -> crate::Result<QueueRecord> {
        Self::decode(&self.quarantined, id)
    }
}
