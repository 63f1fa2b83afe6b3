//! Calendar grid over a rolling window.

use super::average_of;
use crate::primitives::MAX_CALENDAR_WEEKS;
use crate::{DateKey, MoodRecord};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Computed summary of one calendar cell. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: DateKey,
    /// Stored record, absent for unlogged and future days.
    pub data: Option<MoodRecord>,
    /// Mean rating, `None` whenever `data` is.
    pub avg: Option<f64>,
    pub is_today: bool,
    pub is_future: bool,
}

/// Seven consecutive days, Sunday first.
pub type Week = [DayView; 7];

/// Build the Sunday-aligned grid for the `weeks`-long window ending on
/// `window_end`.
///
/// The first cell is the Sunday on or before `window_end - (weeks - 1) * 7`
/// and the last is the Saturday on or after `window_end`, so the grid always
/// holds exactly `weeks` full weeks. `weeks` is clamped to
/// `1..=MAX_CALENDAR_WEEKS`.
///
/// Days after `window_end` are flagged `is_future` and carry neither record
/// nor average, even when the store holds one for them. `is_today` marks
/// `window_end` itself.
#[must_use]
pub fn calendar_grid(
    moods: &BTreeMap<DateKey, MoodRecord>,
    window_end: NaiveDate,
    weeks: u32,
) -> Vec<Week> {
    let weeks = weeks.clamp(1, MAX_CALENDAR_WEEKS);
    let back = u64::from(weeks - 1) * 7 + u64::from(window_end.weekday().num_days_from_sunday());
    let grid_start = window_end
        .checked_sub_days(Days::new(back))
        .unwrap_or(NaiveDate::MIN);

    let view = |date: NaiveDate| {
        let is_future = date > window_end;
        let key = DateKey::from_date(date);
        let data = if is_future {
            None
        } else {
            moods.get(&key).cloned()
        };
        DayView {
            date: key,
            avg: average_of(data.as_ref()),
            data,
            is_today: date == window_end,
            is_future,
        }
    };

    (0..u64::from(weeks))
        .map(|w| {
            std::array::from_fn(|d| {
                let offset = w * 7 + d as u64;
                view(
                    grid_start
                        .checked_add_days(Days::new(offset))
                        .unwrap_or(NaiveDate::MAX),
                )
            })
        })
        .collect()
}
