//! Durable queue of pending deliveries
//!
//! Every record is stored on its own, so each queue operation is atomic per
//! record. Records are identified by monotonic ULIDs, which makes listing
//! the store in id order the same as listing it in arrival order.

pub mod backends;
pub mod config;
pub mod error;
pub mod queue;
pub mod record;
pub mod r#trait;
pub mod types;

pub use backends::{FileBackingStore, MemoryBackingStore, TestBackingStore};
pub use config::{MemoryConfig, SpoolConfig};
pub use error::{Result, SerializationError, SpoolError, ValidationError};
pub use queue::{DurableQueue, PendingScan};
pub use record::{NewRecord, QueueRecord};
pub use r#trait::BackingStore;
pub use types::RecordId;
