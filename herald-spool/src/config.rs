use std::sync::Arc;

use serde::Deserialize;

use crate::{
    backends::{FileBackingStore, MemoryBackingStore},
    queue::DurableQueue,
    r#trait::BackingStore,
};

/// Configuration for the spool backing store
///
/// Configuration files are read with RON's `unwrap_variant_newtypes` and
/// `implicit_some` extensions, so the variant's fields can be written
/// directly inside it.
///
/// # Examples
///
/// File-backed spool in RON config:
/// ```ron
/// Herald (
///     spool: File(
///         path: "/var/spool/herald",
///     ),
/// )
/// ```
///
/// Memory-backed spool, optionally with a capacity limit. Records do not
/// survive a restart:
/// ```ron
/// Herald (
///     spool: Memory(
///         capacity: 1000,
///     ),
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum SpoolConfig {
    /// File-based spool (production)
    File(FileBackingStore),
    /// Memory-based spool (testing/development)
    Memory(MemoryConfig),
}

/// Configuration for memory-backed spool
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MemoryConfig {
    /// Maximum number of active records (omit for unlimited)
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self::File(FileBackingStore::default())
    }
}

impl SpoolConfig {
    /// Filesystem path for file-backed spools
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::File(store) => Some(store.path()),
            Self::Memory(_) => None,
        }
    }

    /// Build and initialise the configured store.
    ///
    /// # Errors
    /// If a file-backed spool cannot be initialised (directory creation,
    /// permissions, a file in place of a directory).
    pub fn into_backing_store(self) -> crate::Result<Arc<dyn BackingStore>> {
        Ok(match self {
            Self::File(store) => {
                store.init()?;
                Arc::new(store)
            }
            Self::Memory(config) => config.capacity.map_or_else(
                || Arc::new(MemoryBackingStore::new()) as Arc<dyn BackingStore>,
                |capacity| Arc::new(MemoryBackingStore::with_capacity(capacity)),
            ),
        })
    }

    /// Build the configured store and wrap it in a [`DurableQueue`].
    ///
    /// # Errors
    /// See [`Self::into_backing_store`].
    pub fn into_queue(self) -> crate::Result<DurableQueue> {
        self.into_backing_store().map(DurableQueue::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ron::{Options, extensions::Extensions};

    use super::*;

    fn parse(source: &str) -> ron::error::SpannedResult<SpoolConfig> {
        Options::default()
            .with_default_extension(
                Extensions::UNWRAP_VARIANT_NEWTYPES | Extensions::IMPLICIT_SOME,
            )
            .from_str(source)
    }

    #[test]
    fn test_parse_file_config() {
        let config = parse(r#"File(path: "/var/spool/herald")"#).unwrap();
        assert_eq!(
            config.path(),
            Some(std::path::Path::new("/var/spool/herald"))
        );
    }

    #[test]
    fn test_parse_memory_config() {
        let config = parse("Memory(capacity: 10)").unwrap();
        assert!(matches!(
            config,
            SpoolConfig::Memory(MemoryConfig { capacity: Some(10) })
        ));
        assert!(config.path().is_none());
    }

    #[test]
    fn test_invalid_path_rejected() {
        assert!(parse(r#"File(path: "/etc/herald")"#).is_err());
    }

    #[tokio::test]
    async fn test_memory_queue() {
        let queue = SpoolConfig::Memory(MemoryConfig::default())
            .into_queue()
            .unwrap();
        assert!(queue.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_queue_initialises_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBackingStore::builder()
            .path(dir.path().join("spool"))
            .build()
            .unwrap();

        let queue = SpoolConfig::File(store).into_queue().unwrap();
        assert!(dir.path().join("spool/queue").is_dir());
        assert!(dir.path().join("spool/dead_letter").is_dir());
        assert!(queue.list_quarantined().await.unwrap().is_empty());
    }
}
