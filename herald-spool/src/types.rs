use std::sync::{LazyLock, Mutex, PoisonError};

use ulid::{Generator, Ulid};

/// File extension of a stored record
pub(crate) const RECORD_EXTENSION: &str = ".json";

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Identifier for a queue record
///
/// A ULID that doubles as the record's filename. Ids generated by one process
/// are strictly increasing, so sorting ids yields enqueue order even when
/// several records are created within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    id: Ulid,
}

impl RecordId {
    /// Parse an id from a filename like `01ARZ3NDEKTSV4RRFFQ69G5FAV.json`
    ///
    /// Anything that is not exactly a ULID followed by the record extension is
    /// rejected, including names containing path separators or `..`.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            return None;
        }

        let stem = filename.strip_suffix(RECORD_EXTENSION)?;
        let id = Ulid::from_string(stem).ok()?;

        Some(Self { id })
    }

    #[must_use]
    pub const fn new(id: Ulid) -> Self {
        Self { id }
    }

    /// Generate the next id in this process
    #[must_use]
    pub fn generate() -> Self {
        let id = GENERATOR
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
            .unwrap_or_else(|_| Ulid::new());

        Self { id }
    }

    pub(crate) fn filename(&self) -> String {
        format!("{}{RECORD_EXTENSION}", self.id)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl std::str::FromStr for RecordId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self::new)
    }
}
