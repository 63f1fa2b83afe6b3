//! # Record Store
//!
//! Durable mapping from `DateKey` to `MoodRecord`.
//!
//! ## Backends
//!
//! - `JsonFileStore`: one JSON document, rewritten atomically (temp + rename)
//! - `RedbStore`: redb embedded database, one ACID transaction per mutation
//! - `InMemoryStore`: volatile `BTreeMap`, for tests and dry runs
//!
//! `StorageBackend` selects one at runtime and is what the service owns.
//!
//! ## Concurrency
//!
//! Single writer. Each mutation is a read-modify-write of the whole store
//! with no cross-process locking; two processes writing the same file race
//! and the last rename wins.

mod file;
mod memory;
mod redb_store;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use redb_store::RedbStore;

use crate::{DateKey, MoodError, MoodRecord};
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Read/write contract shared by all backends.
pub trait MoodStore {
    /// Record for `date`, or `None` when nothing was logged that day.
    fn get(&self, date: &DateKey) -> Result<Option<MoodRecord>, MoodError>;

    /// Store `record` under `date`, replacing any existing record.
    fn put(&mut self, date: DateKey, record: MoodRecord) -> Result<(), MoodError>;

    /// Store every record in `records` in a single write, replacing any
    /// existing records on the same dates. Either all are stored or none.
    fn put_many(&mut self, records: BTreeMap<DateKey, MoodRecord>) -> Result<(), MoodError>;

    /// Remove and return the record for `date`.
    ///
    /// Returns `MoodError::NotFound` if there is none.
    fn delete(&mut self, date: &DateKey) -> Result<MoodRecord, MoodError>;

    /// Every stored record, ordered by date.
    fn list_all(&self) -> Result<BTreeMap<DateKey, MoodRecord>, MoodError>;

    /// Parse `date` and store `record` under it.
    ///
    /// A malformed date is rejected before the store is touched.
    fn put_str(&mut self, date: &str, record: MoodRecord) -> Result<DateKey, MoodError> {
        let key = DateKey::parse(date)?;
        self.put(key, record)?;
        Ok(key)
    }

    /// Number of stored records.
    fn len(&self) -> Result<usize, MoodError> {
        Ok(self.list_all()?.len())
    }

    /// True when nothing has been logged.
    fn is_empty(&self) -> Result<bool, MoodError> {
        Ok(self.len()? == 0)
    }
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Which on-disk format to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// JSON document (default).
    #[default]
    File,
    /// redb database.
    Redb,
}

impl std::str::FromStr for BackendKind {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" | "json" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(MoodError::StorageFailure(format!(
                "Unknown backend: {}. Use: file, redb",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Redb => write!(f, "redb"),
        }
    }
}

/// The store a service runs on.
///
/// Does not implement `Clone`: the redb handle owns the database file.
#[derive(Debug)]
pub enum StorageBackend {
    File(JsonFileStore),
    Redb(RedbStore),
    InMemory(InMemoryStore),
}

impl StorageBackend {
    /// Open (creating if needed) the store at `path`.
    pub fn open(kind: BackendKind, path: impl AsRef<Path>) -> Result<Self, MoodError> {
        match kind {
            BackendKind::File => Ok(Self::File(JsonFileStore::open(path)?)),
            BackendKind::Redb => Ok(Self::Redb(RedbStore::open(path)?)),
        }
    }

    /// Empty volatile store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryStore::new())
    }

    /// Short name for logs and status output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Redb(_) => "redb",
            Self::InMemory(_) => "memory",
        }
    }

    fn inner(&self) -> &dyn MoodStore {
        match self {
            Self::File(s) => s,
            Self::Redb(s) => s,
            Self::InMemory(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn MoodStore {
        match self {
            Self::File(s) => s,
            Self::Redb(s) => s,
            Self::InMemory(s) => s,
        }
    }
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl MoodStore for StorageBackend {
    fn get(&self, date: &DateKey) -> Result<Option<MoodRecord>, MoodError> {
        self.inner().get(date)
    }

    fn put(&mut self, date: DateKey, record: MoodRecord) -> Result<(), MoodError> {
        self.inner_mut().put(date, record)
    }

    fn put_many(&mut self, records: BTreeMap<DateKey, MoodRecord>) -> Result<(), MoodError> {
        self.inner_mut().put_many(records)
    }

    fn delete(&mut self, date: &DateKey) -> Result<MoodRecord, MoodError> {
        self.inner_mut().delete(date)
    }

    fn list_all(&self) -> Result<BTreeMap<DateKey, MoodRecord>, MoodError> {
        self.inner().list_all()
    }

    fn len(&self) -> Result<usize, MoodError> {
        self.inner().len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
