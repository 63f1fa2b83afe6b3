//! # redb-backed Mood Storage
//!
//! Alternative to the JSON document using the redb embedded database:
//! - ACID transactions (one per mutation)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are postcard-encoded under their `YYYY-MM-DD` key, so table
//! iteration order is chronological.

use super::MoodStore;
use crate::primitives::FORMAT_VERSION;
use crate::{DateKey, MoodError, MoodRecord};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Table for records: DateKey text -> postcard MoodRecord bytes
const MOODS: TableDefinition<&str, &[u8]> = TableDefinition::new("moods");

/// Table for metadata: key string -> value string
const METADATA: TableDefinition<&str, &str> = TableDefinition::new("metadata");

fn storage_err(e: impl std::fmt::Display) -> MoodError {
    MoodError::StorageFailure(e.to_string())
}

fn encode(record: &MoodRecord) -> Result<Vec<u8>, MoodError> {
    postcard::to_allocvec(record).map_err(|e| MoodError::SerializationError(e.to_string()))
}

fn decode(key: &str, bytes: &[u8]) -> Result<MoodRecord, MoodError> {
    postcard::from_bytes(bytes).map_err(|e| {
        MoodError::StorageFailure(format!("Corrupt record for {}: {}", key, e))
    })
}

/// A disk-backed mood store using redb.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a mood database at the given path.
    ///
    /// A fresh database is stamped with the current format version; an
    /// existing one must carry the same version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MoodError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        let write_txn = db.begin_write().map_err(storage_err)?;
        {
            let _ = write_txn.open_table(MOODS).map_err(storage_err)?;
            let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;

            let existing = meta
                .get("version")
                .map_err(storage_err)?
                .map(|v| v.value().to_string());
            match existing {
                Some(version) if version != FORMAT_VERSION => {
                    return Err(MoodError::StorageFailure(format!(
                        "Unsupported database version: {} (expected {})",
                        version, FORMAT_VERSION
                    )));
                }
                Some(_) => {}
                None => {
                    tracing::info!(path = %path.as_ref().display(), "Initializing empty mood database");
                    meta.insert("version", FORMAT_VERSION)
                        .map_err(storage_err)?;
                }
            }
        }
        write_txn.commit().map_err(storage_err)?;

        Ok(Self { db })
    }
}

impl MoodStore for RedbStore {
    fn get(&self, date: &DateKey) -> Result<Option<MoodRecord>, MoodError> {
        let key = date.to_string();
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(MOODS).map_err(storage_err)?;
        let guard = table.get(key.as_str()).map_err(storage_err)?;
        guard.map(|bytes| decode(&key, bytes.value())).transpose()
    }

    fn put(&mut self, date: DateKey, record: MoodRecord) -> Result<(), MoodError> {
        let key = date.to_string();
        let bytes = encode(&record)?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(MOODS).map_err(storage_err)?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        tracing::debug!(%date, "Mood record stored");
        Ok(())
    }

    fn put_many(&mut self, records: BTreeMap<DateKey, MoodRecord>) -> Result<(), MoodError> {
        let count = records.len();

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(MOODS).map_err(storage_err)?;
            for (date, record) in &records {
                let key = date.to_string();
                let bytes = encode(record)?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(storage_err)?;
            }
        }
        write_txn.commit().map_err(storage_err)?;

        tracing::debug!(count, "Mood records stored");
        Ok(())
    }

    fn delete(&mut self, date: &DateKey) -> Result<MoodRecord, MoodError> {
        let key = date.to_string();

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        let removed = {
            let mut table = write_txn.open_table(MOODS).map_err(storage_err)?;
            let guard = table.remove(key.as_str()).map_err(storage_err)?;
            guard.map(|bytes| decode(&key, bytes.value())).transpose()?
        };

        let Some(record) = removed else {
            write_txn.abort().map_err(storage_err)?;
            return Err(MoodError::NotFound(*date));
        };
        write_txn.commit().map_err(storage_err)?;

        tracing::debug!(%date, "Mood record deleted");
        Ok(record)
    }

    fn list_all(&self) -> Result<BTreeMap<DateKey, MoodRecord>, MoodError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(MOODS).map_err(storage_err)?;

        let mut moods = BTreeMap::new();
        for entry in table.iter().map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let date = DateKey::parse(key.value()).map_err(|e| {
                MoodError::StorageFailure(format!("Corrupt key in database: {}", e))
            })?;
            moods.insert(date, decode(key.value(), value.value())?);
        }
        Ok(moods)
    }

    fn len(&self) -> Result<usize, MoodError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(MOODS).map_err(storage_err)?;
        Ok(table.len().map_err(storage_err)? as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(s: &str) -> DateKey {
        DateKey::parse(s).expect("date")
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("moods.redb");
        let d = key("2024-06-30");

        {
            let mut store = RedbStore::open(&db_path).expect("open db");
            store.put(d, MoodRecord::neutral()).expect("put");
        }

        let store = RedbStore::open(&db_path).expect("reopen db");
        assert_eq!(store.get(&d).expect("get"), Some(MoodRecord::neutral()));
        assert_eq!(store.len().expect("len"), 1);
    }

    #[test]
    fn list_all_is_chronological() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("moods.redb")).expect("open db");

        for d in ["2024-03-01", "2023-12-31", "2024-01-15"] {
            store.put(key(d), MoodRecord::neutral()).expect("put");
        }

        let dates: Vec<String> = store
            .list_all()
            .expect("list")
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(dates, vec!["2023-12-31", "2024-01-15", "2024-03-01"]);
    }

    #[test]
    fn delete_missing_leaves_store_intact() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("moods.redb")).expect("open db");
        store.put(key("2024-03-01"), MoodRecord::neutral()).expect("put");

        assert!(matches!(
            store.delete(&key("2024-03-02")),
            Err(MoodError::NotFound(_))
        ));
        assert_eq!(store.len().expect("len"), 1);
    }
}
