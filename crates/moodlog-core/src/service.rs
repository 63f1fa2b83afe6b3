//! # Access Facade
//!
//! `MoodService` is the boundary API the presentation layer calls.
//!
//! It owns exactly one store and one clock, both injected at construction;
//! there is no global handle. Every call is a short read or a
//! read-modify-write against that store:
//!
//! ```text
//! caller ──► validate (DateKey / MoodRecord) ──► MoodStore ──► aggregate ──► caller
//! ```
//!
//! Invalid input is rejected before the store is touched. Storage failures
//! are returned unchanged; nothing here retries or substitutes empty data.

use crate::aggregate::{
    DimensionInsight, HistoryEntry, Week, calendar_grid, dimension_insights, history,
    history_in_window,
};
use crate::formats::{ExportDocument, MoodDocument};
use crate::primitives::{MAX_CALENDAR_WEEKS, MAX_HISTORY_LIMIT};
use crate::store::{MoodStore, StorageBackend};
use crate::{DateKey, MoodError, MoodRecord, Ratings};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// CLOCK
// =============================================================================

/// Source of "today" and "now".
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current date in the local/server timezone.
    fn today(&self) -> NaiveDate;

    /// Current instant in UTC, used to stamp exports.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in the server's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Pin the clock at `now`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Pin the clock at midday UTC on `date`.
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        let noon = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self { now: noon }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Acknowledgement of a write, holding what the store returned on the
/// confirmatory read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitAck {
    pub date: DateKey,
    pub data: MoodRecord,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub replaced: usize,
}

// =============================================================================
// SERVICE
// =============================================================================

/// The mood tracker facade.
#[derive(Debug)]
pub struct MoodService {
    store: StorageBackend,
    clock: Box<dyn Clock>,
}

impl MoodService {
    /// Build a service over `store`, reading time from `clock`.
    pub fn new(store: StorageBackend, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            clock: Box::new(clock),
        }
    }

    /// Volatile service on the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StorageBackend::in_memory(), SystemClock)
    }

    /// Name of the backing store.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Today's key according to the injected clock.
    #[must_use]
    pub fn today(&self) -> DateKey {
        DateKey::from_date(self.clock.today())
    }

    // -------------------------------------------------------------------------
    // Today
    // -------------------------------------------------------------------------

    /// Today's record, or the neutral record if nothing is logged yet.
    pub fn fetch_today(&self) -> Result<MoodRecord, MoodError> {
        Ok(self.store.get(&self.today())?.unwrap_or_default())
    }

    /// Validate `ratings` and store them as today's record.
    ///
    /// The write is followed by one confirmatory read; the acknowledgement
    /// carries what the store holds afterwards.
    pub fn submit(&mut self, ratings: &Ratings) -> Result<SubmitAck, MoodError> {
        let today = self.today().to_string();
        self.upsert(&today, ratings)
    }

    // -------------------------------------------------------------------------
    // Date-addressed operations
    // -------------------------------------------------------------------------

    /// Record for `date`; `None` if nothing is logged.
    pub fn get(&self, date: &str) -> Result<Option<MoodRecord>, MoodError> {
        let key = DateKey::parse(date)?;
        self.store.get(&key)
    }

    /// Validate and store a full record for `date`, replacing any existing one.
    pub fn upsert(&mut self, date: &str, ratings: &Ratings) -> Result<SubmitAck, MoodError> {
        let key = DateKey::parse(date)?;
        let record = MoodRecord::from_ratings(ratings)?;

        self.store.put(key, record)?;
        let stored = self.store.get(&key)?.ok_or_else(|| {
            MoodError::StorageFailure(format!("Record for {} missing after write", key))
        })?;

        tracing::info!(date = %key, average = stored.average(), "Mood saved");
        Ok(SubmitAck {
            date: key,
            data: stored,
        })
    }

    /// Delete the record for `date`.
    pub fn remove(&mut self, date: &str) -> Result<MoodRecord, MoodError> {
        let key = DateKey::parse(date)?;
        let removed = self.store.delete(&key)?;
        tracing::info!(date = %key, "Mood deleted");
        Ok(removed)
    }

    // -------------------------------------------------------------------------
    // Listings and derived views
    // -------------------------------------------------------------------------

    /// Every record, ordered by date.
    pub fn list_all(&self) -> Result<BTreeMap<DateKey, MoodRecord>, MoodError> {
        self.store.list_all()
    }

    /// Up to `limit` records, most recent first.
    ///
    /// `limit` is capped at `MAX_HISTORY_LIMIT`.
    pub fn fetch_history(&self, limit: usize) -> Result<Vec<HistoryEntry>, MoodError> {
        let moods = self.store.list_all()?;
        Ok(history(&moods, limit.min(MAX_HISTORY_LIMIT)))
    }

    /// Calendar grid of `weeks` weeks ending today.
    pub fn calendar(&self, weeks: u32) -> Result<Vec<Week>, MoodError> {
        let weeks = validate_weeks(weeks)?;
        let moods = self.store.list_all()?;
        Ok(calendar_grid(&moods, self.clock.today(), weeks))
    }

    /// Per-dimension insights over the `weeks`-long window ending today.
    ///
    /// `None` until enough days are logged inside the window.
    pub fn insights(&self, weeks: u32) -> Result<Option<Vec<DimensionInsight>>, MoodError> {
        let weeks = validate_weeks(weeks)?;
        let moods = self.store.list_all()?;
        let recent = history_in_window(&moods, self.clock.today(), weeks);
        Ok(dimension_insights(&recent))
    }

    // -------------------------------------------------------------------------
    // Export / import
    // -------------------------------------------------------------------------

    /// Snapshot of the whole store, stamped with the clock's current time.
    pub fn export(&self) -> Result<ExportDocument, MoodError> {
        Ok(ExportDocument::new(self.store.list_all()?, self.clock.now()))
    }

    /// Write every record of `document` into the store in one batch.
    ///
    /// Dates already present are replaced; others are left alone. A storage
    /// failure leaves the store as it was.
    pub fn import(&mut self, document: MoodDocument) -> Result<ImportSummary, MoodError> {
        let existing = self.store.list_all()?;
        let summary = ImportSummary {
            imported: document.moods.len(),
            replaced: document
                .moods
                .keys()
                .filter(|date| existing.contains_key(date))
                .count(),
        };
        self.store.put_many(document.moods)?;
        tracing::info!(
            imported = summary.imported,
            replaced = summary.replaced,
            "Import complete"
        );
        Ok(summary)
    }
}

fn validate_weeks(weeks: u32) -> Result<u32, MoodError> {
    if weeks == 0 || weeks > MAX_CALENDAR_WEEKS {
        return Err(MoodError::InvalidRecord(format!(
            "weeks must be between 1 and {} (got {})",
            MAX_CALENDAR_WEEKS, weeks
        )));
    }
    Ok(weeks)
}

impl Default for MoodService {
    fn default() -> Self {
        Self::in_memory()
    }
}

// =============================================================================
// TESTS
// =============================================================================
