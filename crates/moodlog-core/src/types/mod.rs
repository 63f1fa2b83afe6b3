//! # Core Type Definitions
//!
//! This module contains the value types shared by every Moodlog component:
//! - `DateKey`: the canonical `YYYY-MM-DD` identifier of one day
//! - `MoodRecord`: a complete, validated set of ratings for one day
//! - `Ratings`: raw, unvalidated caller input
//! - `MoodError`: the error taxonomy
//!
//! ## Invariants
//!
//! Both `DateKey` and `MoodRecord` can only be built through validation.
//! Anything holding one of them (a store, the aggregator, an API response)
//! never needs to re-check format, completeness or range.

use crate::primitives::{MAX_RATING, MIN_RATING};
use crate::schema::{DIMENSIONS, dimension_ids, find_dimension};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// DATE KEY
// =============================================================================

/// Calendar date used as the sole identifier and sort key of a record.
///
/// The textual form is exactly `YYYY-MM-DD` and must name a real date.
/// Ordering is chronological, which for four-digit years is also the
/// lexicographic order of the textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Parse and validate a `YYYY-MM-DD` string.
    ///
    /// Rejects anything that is not 4-2-2 ASCII digits separated by `-`
    /// (so `2024-1-5` and `2024-01-05T00:00` fail) and impossible dates
    /// such as `2023-02-29`.
    pub fn parse(s: &str) -> Result<Self, MoodError> {
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[4] == b'-'
            && bytes[7] == b'-'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
        if !shape_ok {
            return Err(MoodError::InvalidDate(format!(
                "'{}' does not match YYYY-MM-DD",
                s
            )));
        }

        let year: i32 = s[0..4]
            .parse()
            .map_err(|_| MoodError::InvalidDate(s.to_string()))?;
        let month: u32 = s[5..7]
            .parse()
            .map_err(|_| MoodError::InvalidDate(s.to_string()))?;
        let day: u32 = s[8..10]
            .parse()
            .map_err(|_| MoodError::InvalidDate(s.to_string()))?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| MoodError::InvalidDate(format!("'{}' is not a calendar date", s)))
    }

    /// Wrap a calendar date.
    #[must_use]
    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The underlying calendar date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// RATINGS (raw input)
// =============================================================================

/// Unvalidated ratings as supplied by a caller.
///
/// Values may be fractional (slider drag positions); they are rounded when
/// converted into a `MoodRecord`.
pub type Ratings = BTreeMap<String, f64>;

// =============================================================================
// MOOD RECORD
// =============================================================================

/// A complete set of dimension ratings for one date.
///
/// Holds exactly one integer in `[-2, 2]` per schema dimension and no other
/// key. Updates always replace the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i8>", into = "BTreeMap<String, i8>")]
pub struct MoodRecord(BTreeMap<String, i8>);

impl MoodRecord {
    /// Record with every dimension at 0.
    #[must_use]
    pub fn neutral() -> Self {
        Self(dimension_ids().map(|id| (id.to_string(), 0)).collect())
    }

    /// Validate caller input, rounding fractional values to the nearest integer.
    ///
    /// Rounding happens before the range check, so `2.4` is stored as `2`
    /// while `2.6` rounds to `3` and is rejected.
    pub fn from_ratings(ratings: &Ratings) -> Result<Self, MoodError> {
        let mut rounded = BTreeMap::new();
        for (id, value) in ratings {
            if !value.is_finite() {
                return Err(MoodError::InvalidRecord(format!(
                    "dimension '{}' has non-numeric value",
                    id
                )));
            }
            let value = value.round();
            if value < f64::from(MIN_RATING) || value > f64::from(MAX_RATING) {
                return Err(out_of_range(id, value));
            }
            rounded.insert(id.clone(), value as i8);
        }
        Self::try_from(rounded)
    }

    /// Rating for one dimension.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<i8> {
        self.0.get(id).copied()
    }

    /// `(dimension id, rating)` pairs in schema display order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i8)> + '_ {
        DIMENSIONS
            .iter()
            .filter_map(|d| self.0.get(d.id).map(|v| (d.id, *v)))
    }

    /// Arithmetic mean of all ratings.
    #[must_use]
    pub fn average(&self) -> f64 {
        let sum: i32 = self.0.values().map(|&v| i32::from(v)).sum();
        f64::from(sum) / self.0.len() as f64
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, i8> {
        &self.0
    }
}

impl Default for MoodRecord {
    fn default() -> Self {
        Self::neutral()
    }
}

impl TryFrom<BTreeMap<String, i8>> for MoodRecord {
    type Error = MoodError;

    fn try_from(map: BTreeMap<String, i8>) -> Result<Self, Self::Error> {
        if let Some(unknown) = map.keys().find(|k| find_dimension(k).is_none()) {
            return Err(MoodError::InvalidRecord(format!(
                "unknown dimension '{}'",
                unknown
            )));
        }
        if let Some(missing) = dimension_ids().find(|id| !map.contains_key(*id)) {
            return Err(MoodError::InvalidRecord(format!(
                "missing dimension '{}'",
                missing
            )));
        }
        if let Some((id, value)) = map
            .iter()
            .find(|(_, v)| !(MIN_RATING..=MAX_RATING).contains(*v))
        {
            return Err(out_of_range(id, f64::from(*value)));
        }
        Ok(Self(map))
    }
}

impl From<MoodRecord> for BTreeMap<String, i8> {
    fn from(record: MoodRecord) -> Self {
        record.0
    }
}

fn out_of_range(id: &str, value: f64) -> MoodError {
    MoodError::InvalidRecord(format!(
        "dimension '{}' value {} out of range [{}, {}]",
        id, value, MIN_RATING, MAX_RATING
    ))
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Moodlog core.
///
/// - `InvalidDate` and `InvalidRecord` form the invalid-input class: rejected
///   before the store is touched, never worth retrying
/// - `NotFound` is an expected outcome of `delete`
/// - `StorageFailure` is surfaced as is; the core never retries
#[derive(Debug, Error)]
pub enum MoodError {
    /// The date is not a `YYYY-MM-DD` calendar date.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The record is incomplete, has unknown keys, or a value out of range.
    #[error("Invalid mood record: {0}")]
    InvalidRecord(String),

    /// No record exists for the date.
    #[error("Mood not found for {0}")]
    NotFound(DateKey),

    /// Reading or writing the backing store failed.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    /// Encoding a document or value failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MoodError {
    /// True for errors caused by caller input rather than the store.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidDate(_) | Self::InvalidRecord(_))
    }
}

// =============================================================================
// TESTS
// =============================================================================
