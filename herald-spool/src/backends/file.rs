use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use chrono::Utc;
use herald_common::internal;
use serde::Deserialize;
use tokio::fs;

use crate::{
    SpoolError, ValidationError,
    record::{NewRecord, QueueRecord},
    r#trait::BackingStore,
    types::{RECORD_EXTENSION, RecordId},
};

const QUEUE_DIR: &str = "queue";
const DEAD_LETTER_DIR: &str = "dead_letter";
const TEMP_PREFIX: &str = ".tmp_";
const DELETED_SUFFIX: &str = ".deleted";

/// File-based backing store implementation
///
/// Each record is one JSON document named after its ULID:
/// - Active records: `{path}/queue/{id}.json`
/// - Quarantined records: `{path}/dead_letter/{id}.json`
///
/// # Atomicity
/// - Writes and updates go to `.tmp_{id}.json` first and are renamed into
///   place, so a reader only ever sees a complete document.
/// - Deletes rename to `{id}.json.deleted` before unlinking.
/// - Quarantine is a single rename between the two directories.
///
/// Leftover temporary and `.deleted` files from a crash are ignored by
/// `list()` and removed by `init()`.
///
/// # Security
/// - The spool path must be absolute, free of `..` and outside system
///   directories
/// - Only filenames that parse as `{ULID}.json` are ever listed
#[derive(Debug, Clone)]
pub struct FileBackingStore {
    path: PathBuf,
}

impl Default for FileBackingStore {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/spool/herald"),
        }
    }
}

impl<'de> Deserialize<'de> for FileBackingStore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct FileBackingStoreHelper {
            path: PathBuf,
        }

        let helper = FileBackingStoreHelper::deserialize(deserializer)?;
        Self::validate_path(&helper.path).map_err(serde::de::Error::custom)?;

        Ok(Self { path: helper.path })
    }
}

impl FileBackingStore {
    /// Validate a spool path
    ///
    /// # Errors
    /// If the path contains `..`, is relative, or lies in a system directory
    fn validate_path(path: &Path) -> Result<(), ValidationError> {
        if path
            .components()
            .any(|component| component == std::path::Component::ParentDir)
        {
            return Err(ValidationError::InvalidConfiguration(format!(
                "Spool path cannot contain '..' components: {}",
                path.display()
            )));
        }

        if !path.is_absolute() {
            return Err(ValidationError::InvalidConfiguration(format!(
                "Spool path must be absolute: {}",
                path.display()
            )));
        }

        let sensitive_prefixes = [
            "/etc", "/bin", "/sbin", "/usr/bin", "/usr/sbin", "/boot", "/sys", "/proc", "/dev",
        ];

        if let Some(prefix) = sensitive_prefixes.iter().find(|p| path.starts_with(p)) {
            return Err(ValidationError::InvalidConfiguration(format!(
                "Spool path cannot be in system directory {prefix}: {}",
                path.display()
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn builder() -> FileBackingStoreBuilder {
        FileBackingStoreBuilder::default()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn queue_dir(&self) -> PathBuf {
        self.path.join(QUEUE_DIR)
    }

    fn dead_letter_dir(&self) -> PathBuf {
        self.path.join(DEAD_LETTER_DIR)
    }

    /// Initialise the spool directories
    ///
    /// Creates the queue and dead-letter directories if needed and removes
    /// files left behind by interrupted writes and deletes.
    ///
    /// # Errors
    /// - If a directory cannot be created
    /// - If a path exists but is not a directory
    pub fn init(&self) -> crate::Result<()> {
        internal!("Initialising spool at {}", self.path.display());

        for dir in [self.queue_dir(), self.dead_letter_dir()] {
            if !dir.try_exists()? {
                internal!("{} does not exist, creating...", dir.display());
                std::fs::create_dir_all(&dir)?;
            } else if !dir.is_dir() {
                return Err(ValidationError::NotDirectory(dir.display().to_string()).into());
            }
        }

        self.cleanup_orphans()
    }

    fn cleanup_orphans(&self) -> crate::Result<()> {
        let mut cleaned = 0;

        for entry in std::fs::read_dir(self.queue_dir())? {
            let entry = entry?;
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();

            if filename.ends_with(DELETED_SUFFIX) || filename.starts_with(TEMP_PREFIX) {
                std::fs::remove_file(entry.path())?;
                cleaned += 1;
            }
        }

        if cleaned > 0 {
            internal!(
                level = INFO,
                "Cleaned up {cleaned} orphaned files from spool"
            );
        }

        Ok(())
    }

    fn not_found(id: RecordId) -> impl FnOnce(std::io::Error) -> SpoolError {
        move |err| {
            if err.kind() == ErrorKind::NotFound {
                SpoolError::NotFound(id)
            } else {
                SpoolError::Io(err)
            }
        }
    }

    async fn list_dir(dir: &Path) -> crate::Result<Vec<RecordId>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name();
            let filename = filename.to_string_lossy();

            if filename.ends_with(RECORD_EXTENSION)
                && !filename.starts_with(TEMP_PREFIX)
                && let Some(id) = RecordId::from_filename(&filename)
            {
                ids.push(id);
            }
        }

        ids.sort_unstable();
        Ok(ids)
    }

    async fn read_from(dir: &Path, id: RecordId) -> crate::Result<QueueRecord> {
        let bytes = fs::read(dir.join(id.filename()))
            .await
            .map_err(Self::not_found(id))?;

        Ok(QueueRecord::from_json(id, &bytes)?)
    }

    /// Write `record` through a temporary file and rename it into place
    async fn store(&self, record: &QueueRecord) -> crate::Result<()> {
        let filename = record.id().filename();
        let temp_path = self.queue_dir().join(format!("{TEMP_PREFIX}{filename}"));

        fs::write(&temp_path, record.to_json()?).await?;
        fs::rename(&temp_path, self.queue_dir().join(&filename)).await?;

        Ok(())
    }
}

#[async_trait]
impl BackingStore for FileBackingStore {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn write(&self, draft: NewRecord) -> crate::Result<QueueRecord> {
        let record = QueueRecord::create(RecordId::generate(), draft, Utc::now());
        let path = self.queue_dir().join(record.id().filename());

        if fs::try_exists(&path).await.unwrap_or(false) {
            return Err(SpoolError::AlreadyExists(record.id()));
        }

        self.store(&record).await?;

        internal!(
            level = DEBUG,
            "Spooled record {} to {}",
            record.id(),
            path.display()
        );

        Ok(record)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list(&self) -> crate::Result<Vec<RecordId>> {
        let ids = Self::list_dir(&self.queue_dir()).await?;
        internal!(level = DEBUG, "Found {} records in spool", ids.len());
        Ok(ids)
    }

    #[tracing::instrument(level = "debug", skip(self), fields(id = %id))]
    async fn read(&self, id: &RecordId) -> crate::Result<QueueRecord> {
        Self::read_from(&self.queue_dir(), *id).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(id = %record.id()))]
    async fn update(&self, record: &QueueRecord) -> crate::Result<()> {
        let path = self.queue_dir().join(record.id().filename());
        if !fs::try_exists(&path).await? {
            return Err(SpoolError::NotFound(record.id()));
        }

        self.store(record).await
    }

    /// Two-phase delete: rename to `.deleted`, then unlink. A crash between
    /// the phases leaves a file that `list()` ignores and `init()` removes.
    #[tracing::instrument(level = "debug", skip(self), fields(id = %id))]
    async fn delete(&self, id: &RecordId) -> crate::Result<()> {
        let filename = id.filename();
        let path = self.queue_dir().join(&filename);
        let deleted_path = self.queue_dir().join(format!("{filename}{DELETED_SUFFIX}"));

        fs::rename(&path, &deleted_path)
            .await
            .map_err(Self::not_found(*id))?;
        fs::remove_file(&deleted_path).await?;

        internal!(level = DEBUG, "Deleted record {id} from spool");

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(id = %id))]
    async fn quarantine(&self, id: &RecordId) -> crate::Result<()> {
        let filename = id.filename();

        fs::rename(
            self.queue_dir().join(&filename),
            self.dead_letter_dir().join(&filename),
        )
        .await
        .map_err(Self::not_found(*id))?;

        internal!(level = DEBUG, "Moved record {id} to dead letter");

        Ok(())
    }

    async fn list_quarantined(&self) -> crate::Result<Vec<RecordId>> {
        Self::list_dir(&self.dead_letter_dir()).await
    }

    async fn read_quarantined(&self, id: &RecordId) -> crate::Result<QueueRecord> {
        Self::read_from(&self.dead_letter_dir(), *id).await
    }
}

/// Builder for `FileBackingStore`
#[derive(Debug, Default)]
pub struct FileBackingStoreBuilder {
    path: PathBuf,
}

impl FileBackingStoreBuilder {
    #[must_use]
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// # Errors
    /// Returns an error if the path is invalid or potentially dangerous
    pub fn build(self) -> crate::Result<FileBackingStore> {
        FileBackingStore::validate_path(&self.path)?;
        Ok(FileBackingStore { path: self.path })
    }
}
