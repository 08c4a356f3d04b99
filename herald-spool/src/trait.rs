use async_trait::async_trait;

use crate::{
    record::{NewRecord, QueueRecord},
    types::RecordId,
};

/// Storage for queue records
///
/// Every operation is atomic for the record it touches: a crash part-way
/// through leaves either the old or the new version of a record, never a
/// mixture. A record is in exactly one of three states: active, quarantined,
/// or gone.
#[async_trait]
pub trait BackingStore: Send + Sync + std::fmt::Debug {
    /// Assign a fresh id to `draft` and store it as an active record
    async fn write(&self, draft: NewRecord) -> crate::Result<QueueRecord>;

    /// Ids of all active records, oldest first
    async fn list(&self) -> crate::Result<Vec<RecordId>>;

    /// Read an active record
    ///
    /// Fails with [`crate::SpoolError::Serialization`] when the stored
    /// document is unreadable.
    async fn read(&self, id: &RecordId) -> crate::Result<QueueRecord>;

    /// Replace the stored version of an active record
    async fn update(&self, record: &QueueRecord) -> crate::Result<()>;

    /// Delete an active record permanently
    async fn delete(&self, id: &RecordId) -> crate::Result<()>;

    /// Move an active record to the dead-letter area
    async fn quarantine(&self, id: &RecordId) -> crate::Result<()>;

    /// Ids of all quarantined records, oldest first
    async fn list_quarantined(&self) -> crate::Result<Vec<RecordId>>;

    /// Read a quarantined record
    async fn read_quarantined(&self, id: &RecordId) -> crate::Result<QueueRecord>;
}
