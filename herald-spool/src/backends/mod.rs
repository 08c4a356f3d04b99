//! Backing store implementations
//!
//! - `file`: one JSON document per record, for production use
//! - `memory`: in-process storage for development
//! - `test`: memory storage with synchronization and fault hooks

pub mod file;
pub mod memory;

pub use file::{FileBackingStore, FileBackingStoreBuilder};
pub use memory::MemoryBackingStore;
pub use test::TestBackingStore;
