//! # Aggregator
//!
//! Pure views derived from stored records. Nothing here touches a store;
//! callers pass in the map returned by `MoodStore::list_all`.
//!
//! - `average_of`: mean rating of one day
//! - `history`: most-recent-first listing
//! - `calendar_grid`: Sunday-aligned weeks over a rolling window
//! - `trend` / `dimension_insights`: recent-versus-earlier comparison

mod calendar;
mod trend;

pub use calendar::{DayView, Week, calendar_grid};
pub use trend::{DimensionInsight, TrendDirection, dimension_insights, trend};

use crate::{DateKey, MoodRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean of all dimension ratings, or `None` for a day with no record.
///
/// Not rounded; formatting is the consumer's business.
#[must_use]
pub fn average_of(record: Option<&MoodRecord>) -> Option<f64> {
    record.map(MoodRecord::average)
}

/// One logged day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateKey,
    pub data: MoodRecord,
}

/// Up to `limit` records, most recent first.
#[must_use]
pub fn history(moods: &BTreeMap<DateKey, MoodRecord>, limit: usize) -> Vec<HistoryEntry> {
    moods
        .iter()
        .rev()
        .take(limit)
        .map(|(date, data)| HistoryEntry {
            date: *date,
            data: data.clone(),
        })
        .collect()
}

/// Records dated within the `weeks`-long window ending on `window_end`
/// (inclusive), most recent first.
#[must_use]
pub fn history_in_window(
    moods: &BTreeMap<DateKey, MoodRecord>,
    window_end: NaiveDate,
    weeks: u32,
) -> Vec<HistoryEntry> {
    let span_days = u64::from(weeks.max(1)) * 7 - 1;
    let start = window_end
        .checked_sub_days(chrono::Days::new(span_days))
        .unwrap_or(NaiveDate::MIN);

    moods
        .range(DateKey::from_date(start)..=DateKey::from_date(window_end))
        .rev()
        .map(|(date, data)| HistoryEntry {
            date: *date,
            data: data.clone(),
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
