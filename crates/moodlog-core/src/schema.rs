//! # Mood Schema
//!
//! The fixed, ordered set of mood dimensions.
//!
//! Order is significant: it is the display order used by every consumer and
//! the order in which insights are reported. The set is compiled in and
//! never changes at runtime.

use crate::MoodRecord;
use serde::Serialize;

/// Static descriptor of one tracked facet of mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimension {
    /// Stable key used in records and on disk.
    pub id: &'static str,
    /// Human-readable name.
    pub label: &'static str,
    pub emoji: &'static str,
    /// Label of the -2 end of the scale.
    pub left: &'static str,
    /// Label of the +2 end of the scale.
    pub right: &'static str,
}

/// All dimensions, in display order.
pub static DIMENSIONS: [Dimension; 6] = [
    Dimension {
        id: "overall",
        label: "Overall",
        emoji: "\u{1F60A}",
        left: "Low",
        right: "Great",
    },
    Dimension {
        id: "home",
        label: "Home",
        emoji: "\u{1F3E0}",
        left: "Conflict",
        right: "Harmony",
    },
    Dimension {
        id: "work",
        label: "Work",
        emoji: "\u{1F4BC}",
        left: "Stressed",
        right: "Flow",
    },
    Dimension {
        id: "health",
        label: "Health",
        emoji: "\u{1F34E}",
        left: "Sluggish",
        right: "Energized",
    },
    Dimension {
        id: "sleep",
        label: "Sleep",
        emoji: "\u{1F4A4}",
        left: "Restless",
        right: "Restorative",
    },
    Dimension {
        id: "social",
        label: "Social",
        emoji: "\u{1F465}",
        left: "Isolated",
        right: "Connected",
    },
];

/// Iterate dimension ids in display order.
pub fn dimension_ids() -> impl Iterator<Item = &'static str> {
    DIMENSIONS.iter().map(|d| d.id)
}

/// Look up a dimension by id.
#[must_use]
pub fn find_dimension(id: &str) -> Option<&'static Dimension> {
    DIMENSIONS.iter().find(|d| d.id == id)
}

/// A record with every dimension at 0.
#[must_use]
pub fn neutral_record() -> MoodRecord {
    MoodRecord::neutral()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn ids_are_unique() {
        let ids: BTreeSet<_> = dimension_ids().collect();
        assert_eq!(ids.len(), DIMENSIONS.len());
    }

    #[test]
    fn display_order_starts_with_overall() {
        let ids: Vec<_> = dimension_ids().collect();
        assert_eq!(
            ids,
            vec!["overall", "home", "work", "health", "sleep", "social"]
        );
    }

    #[test]
    fn neutral_record_is_all_zero() {
        let record = neutral_record();
        for id in dimension_ids() {
            assert_eq!(record.get(id), Some(0));
        }
    }

    #[test]
    fn unknown_dimension_lookup() {
        assert!(find_dimension("sleep").is_some());
        assert!(find_dimension("weather").is_none());
    }
}
