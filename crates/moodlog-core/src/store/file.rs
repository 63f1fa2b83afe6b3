//! # JSON File Store
//!
//! The canonical backend: the whole store is one JSON document.
//!
//! Every operation reads the document from disk; every mutation rewrites
//! it through `atomic_write`, so a crash leaves either the old or the new
//! document in place and never a half-written one.

use super::MoodStore;
use crate::formats::{MoodDocument, document_from_bytes, document_to_bytes};
use crate::primitives::MAX_DOCUMENT_SIZE;
use crate::{DateKey, MoodError, MoodRecord};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Store backed by a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    #[cfg(test)]
    rewrites: usize,
}

impl JsonFileStore {
    /// Open the document at `path`, creating it (and its parent
    /// directories) with an empty `moods` map if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MoodError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            #[cfg(test)]
            rewrites: 0,
        };
        store.ensure_document()?;
        Ok(store)
    }

    /// Location of the canonical document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_document(&self) -> Result<(), MoodError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                MoodError::StorageFailure(format!(
                    "Cannot create data directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        tracing::info!(path = %self.path.display(), "Initializing empty mood document");
        self.write_document(&MoodDocument::new())
    }

    fn read_document(&self) -> Result<MoodDocument, MoodError> {
        self.ensure_document()?;

        let metadata = fs::metadata(&self.path)
            .map_err(|e| MoodError::StorageFailure(format!("Cannot stat document: {}", e)))?;
        if metadata.len() > MAX_DOCUMENT_SIZE {
            return Err(MoodError::StorageFailure(format!(
                "Document size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_DOCUMENT_SIZE
            )));
        }

        let bytes = fs::read(&self.path)
            .map_err(|e| MoodError::StorageFailure(format!("Read document: {}", e)))?;
        document_from_bytes(&bytes).inspect_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Mood document unreadable");
        })
    }

    fn write_document(&self, document: &MoodDocument) -> Result<(), MoodError> {
        let bytes = document_to_bytes(document)?;
        atomic_write(&self.path, &bytes)
            .map_err(|e| MoodError::StorageFailure(format!("Write document: {}", e)))
    }

    /// Replace the document after a mutation.
    fn commit(&mut self, document: &MoodDocument) -> Result<(), MoodError> {
        self.write_document(document)?;
        #[cfg(test)]
        {
            self.rewrites += 1;
        }
        Ok(())
    }
}

impl MoodStore for JsonFileStore {
    fn get(&self, date: &DateKey) -> Result<Option<MoodRecord>, MoodError> {
        Ok(self.read_document()?.moods.remove(date))
    }

    fn put(&mut self, date: DateKey, record: MoodRecord) -> Result<(), MoodError> {
        let mut document = self.read_document()?;
        document.moods.insert(date, record);
        self.commit(&document)?;
        tracing::debug!(%date, "Mood record stored");
        Ok(())
    }

    fn put_many(&mut self, records: BTreeMap<DateKey, MoodRecord>) -> Result<(), MoodError> {
        if records.is_empty() {
            return Ok(());
        }
        let count = records.len();
        let mut document = self.read_document()?;
        document.moods.extend(records);
        self.commit(&document)?;
        tracing::debug!(count, "Mood records stored");
        Ok(())
    }

    fn delete(&mut self, date: &DateKey) -> Result<MoodRecord, MoodError> {
        let mut document = self.read_document()?;
        let removed = document
            .moods
            .remove(date)
            .ok_or(MoodError::NotFound(*date))?;
        self.commit(&document)?;
        tracing::debug!(%date, "Mood record deleted");
        Ok(removed)
    }

    fn list_all(&self) -> Result<BTreeMap<DateKey, MoodRecord>, MoodError> {
        Ok(self.read_document()?.moods)
    }
}

// =============================================================================
// ATOMIC WRITE
// =============================================================================

/// Write `data` to a sibling temp file, fsync it, then rename over `path`.
///
/// The temp name carries the process id so two processes never share one.
/// On failure the temp file is removed and `path` is untouched.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = temp_path_for(path);

    if let Err(e) = write_and_rename(&tmp_path, path, data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    // Flush the directory entry where the platform allows opening directories.
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir_file) = fs::File::open(dir) {
            let _ = dir_file.sync_all();
        }
    }
    Ok(())
}

fn write_and_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    fs::rename(tmp_path, path)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "moods".to_string());
    path.with_file_name(format!("{}.tmp.{}", name, std::process::id()))
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
    fn open_creates_empty_versioned_document() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("data").join("db.json");

        let store = JsonFileStore::open(&path).expect("open");
        assert!(path.exists());
        assert!(store.list_all().expect("list").is_empty());

        let raw = fs::read_to_string(&path).expect("read");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(json["version"], crate::primitives::FORMAT_VERSION);
        assert!(json["moods"].as_object().is_some_and(|m| m.is_empty()));
    }

    #[test]
    fn persistence_across_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        let d = key("2024-01-15");

        {
            let mut store = JsonFileStore::open(&path).expect("open");
            store.put(d, MoodRecord::neutral()).expect("put");
        }

        let store = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(store.get(&d).expect("get"), Some(MoodRecord::neutral()));
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        let mut store = JsonFileStore::open(&path).expect("open");
        store.put(key("2024-01-15"), MoodRecord::neutral()).expect("put");

        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);
    }

    #[test]
    fn document_deleted_underneath_is_recreated() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        let store = JsonFileStore::open(&path).expect("open");

        fs::remove_file(&path).expect("remove");
        assert!(store.list_all().expect("list").is_empty());
        assert!(path.exists());
    }

    #[test]
    fn corrupt_document_is_storage_failure_not_empty() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        fs::write(&path, b"{ \"moods\": ").expect("write");

        let store = JsonFileStore::open(&path).expect("open existing");
        let err = store.list_all().expect_err("corrupt");
        assert!(matches!(err, MoodError::StorageFailure(_)));
    }

    #[test]
    fn legacy_document_is_readable() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        fs::write(
            &path,
            br#"{ "moods": { "2024-02-01": { "overall": 2, "home": -2, "work": 0, "health": 0, "sleep": 0, "social": 0 } } }"#,
        )
        .expect("write");

        let store = JsonFileStore::open(&path).expect("open");
        let record = store.get(&key("2024-02-01")).expect("get").expect("present");
        assert_eq!(record.get("home"), Some(-2));
    }

    #[test]
    fn batch_write_rewrites_document_once() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        let mut store = JsonFileStore::open(&path).expect("open");
        store.put(key("2020-01-01"), MoodRecord::neutral()).expect("put");
        assert_eq!(store.rewrites, 1);

        let start = key("2020-01-01").date();
        let batch: BTreeMap<DateKey, MoodRecord> = start
            .iter_days()
            .take(1500)
            .map(|d| (DateKey::from_date(d), MoodRecord::neutral()))
            .collect();
        store.put_many(batch).expect("put_many");

        assert_eq!(store.rewrites, 2);
        assert_eq!(store.len().expect("len"), 1500);
        let reopened = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(reopened.len().expect("len"), 1500);
    }

    #[test]
    fn batch_write_on_corrupt_document_changes_nothing() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("db.json");
        fs::write(&path, b"{ \"moods\": ").expect("write");
        let mut store = JsonFileStore::open(&path).expect("open existing");

        let batch: BTreeMap<DateKey, MoodRecord> =
            [(key("2024-01-01"), MoodRecord::neutral())].into_iter().collect();
        let err = store.put_many(batch).expect_err("corrupt");
        assert!(matches!(err, MoodError::StorageFailure(_)));
        assert_eq!(store.rewrites, 0);
        assert_eq!(fs::read(&path).expect("read"), b"{ \"moods\": ");
    }

    #[test]
    fn temp_path_is_sibling() {
        let path = Path::new("/var/lib/moodlog/db.json");
        let tmp = temp_path_for(path);
        assert_eq!(tmp.parent(), path.parent());
        assert!(tmp.to_string_lossy().starts_with("/var/lib/moodlog/db.json.tmp."));
    }
}
