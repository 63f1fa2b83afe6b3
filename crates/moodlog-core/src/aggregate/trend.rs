//! Trend detection and per-dimension insights.
//!
//! Sign convention: input is ordered most-recent-first and a positive trend
//! means the recent days rate higher than the earlier ones (improving).

use super::HistoryEntry;
use crate::primitives::{MIN_INSIGHT_DAYS, MIN_TREND_VALUES, TREND_SPAN, TREND_THRESHOLD};
use crate::schema::{DIMENSIONS, Dimension};
use serde::Serialize;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `mean(first 3) - mean(last 3)` of a most-recent-first sequence.
///
/// Fewer than 7 values carry too little signal and yield exactly `0.0`.
#[must_use]
pub fn trend(values: &[f64]) -> f64 {
    if values.len() < MIN_TREND_VALUES {
        return 0.0;
    }
    let recent = &values[..TREND_SPAN];
    let earlier = &values[values.len() - TREND_SPAN..];
    mean(recent) - mean(earlier)
}

/// Direction of a trend once the noise band is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Steady,
}

impl TrendDirection {
    /// Classify `trend` against `TREND_THRESHOLD`.
    #[must_use]
    pub fn classify(trend: f64) -> Self {
        if trend > TREND_THRESHOLD {
            Self::Improving
        } else if trend < -TREND_THRESHOLD {
            Self::Declining
        } else {
            Self::Steady
        }
    }
}

/// Average and trend of one dimension over a history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionInsight {
    pub dimension: Dimension,
    pub average: f64,
    pub trend: f64,
    pub direction: TrendDirection,
}

/// Per-dimension insights, in schema order, over a most-recent-first history.
///
/// Returns `None` until at least `MIN_INSIGHT_DAYS` days are logged.
#[must_use]
pub fn dimension_insights(history: &[HistoryEntry]) -> Option<Vec<DimensionInsight>> {
    if history.len() < MIN_INSIGHT_DAYS {
        return None;
    }

    let insights = DIMENSIONS
        .iter()
        .map(|dimension| {
            let values: Vec<f64> = history
                .iter()
                .map(|entry| f64::from(entry.data.get(dimension.id).unwrap_or(0)))
                .collect();
            let trend = trend(&values);
            DimensionInsight {
                dimension: *dimension,
                average: mean(&values),
                trend,
                direction: TrendDirection::classify(trend),
            }
        })
        .collect();

    Some(insights)
}
