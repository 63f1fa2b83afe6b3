//! # Fixed Primitives
//!
//! Compile-time constants for the Moodlog core.
//!
//! The rating scale, format version, aggregation windows and input limits
//! are fixed here and immutable at runtime.

/// Lowest rating a dimension can hold.
pub const MIN_RATING: i8 = -2;

/// Highest rating a dimension can hold.
pub const MAX_RATING: i8 = 2;

/// Version tag written into every store document and export.
///
/// Increment this when making breaking changes to the document layout.
pub const FORMAT_VERSION: &str = "1.0";

/// Maximum accepted size of the backing document.
///
/// Checked before parsing. Ten years of daily records is well under 1 MB.
pub const MAX_DOCUMENT_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// AGGREGATION WINDOWS
// =============================================================================

/// Length of the calendar window when the caller does not choose one.
pub const DEFAULT_CALENDAR_WEEKS: u32 = 12;

/// Upper bound on the calendar window (about ten years).
pub const MAX_CALENDAR_WEEKS: u32 = 520;

/// Minimum number of values before `trend` reports anything but zero.
pub const MIN_TREND_VALUES: usize = 7;

/// Size of the recent and earlier slices compared by `trend`.
pub const TREND_SPAN: usize = 3;

/// Absolute trend beyond which a dimension counts as improving or declining.
pub const TREND_THRESHOLD: f64 = 0.3;

/// Minimum number of logged days before insights are produced.
pub const MIN_INSIGHT_DAYS: usize = 3;

// =============================================================================
// INPUT LIMITS
// =============================================================================

/// Default number of entries returned by history listings.
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// Maximum number of entries a single history request may ask for.
pub const MAX_HISTORY_LIMIT: usize = 3660;
