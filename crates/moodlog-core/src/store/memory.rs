//! # In-Memory Store
//!
//! Volatile backend for tests and for embedders that do not need persistence.

use super::MoodStore;
use crate::{DateKey, MoodError, MoodRecord};
use std::collections::BTreeMap;

/// Store holding records in a `BTreeMap`; nothing touches disk.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    moods: BTreeMap<DateKey, MoodRecord>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `moods`.
    #[must_use]
    pub fn with_moods(moods: BTreeMap<DateKey, MoodRecord>) -> Self {
        Self { moods }
    }
}

impl MoodStore for InMemoryStore {
    fn get(&self, date: &DateKey) -> Result<Option<MoodRecord>, MoodError> {
        Ok(self.moods.get(date).cloned())
    }

    fn put(&mut self, date: DateKey, record: MoodRecord) -> Result<(), MoodError> {
        self.moods.insert(date, record);
        Ok(())
    }

    fn put_many(&mut self, records: BTreeMap<DateKey, MoodRecord>) -> Result<(), MoodError> {
        self.moods.extend(records);
        Ok(())
    }

    fn delete(&mut self, date: &DateKey) -> Result<MoodRecord, MoodError> {
        self.moods.remove(date).ok_or(MoodError::NotFound(*date))
    }

    fn list_all(&self) -> Result<BTreeMap<DateKey, MoodRecord>, MoodError> {
        Ok(self.moods.clone())
    }

    fn len(&self) -> Result<usize, MoodError> {
        Ok(self.moods.len())
    }
}
