//! # moodlog-core
//!
//! The persistence and aggregation layer for Moodlog - THE LOGIC.
//!
//! A single user logs one multi-dimensional mood record per day. This crate
//! owns everything with real invariants:
//! - `schema`: the fixed, ordered set of mood dimensions
//! - `types`: `DateKey`, `MoodRecord`, `MoodError`
//! - `store`: date-keyed record stores with atomic persistence
//! - `formats`: the on-disk document and export envelope
//! - `aggregate`: averages, calendar grid, trends, insights
//! - `service`: the facade the presentation layer calls
//!
//! ## Architectural Constraints
//!
//! - No async, no network: the app layer adds both
//! - No global state: the store and clock are injected into `MoodService`
//! - Single writer per backing document; no cross-process locking

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod formats;
pub mod primitives;
pub mod schema;
pub mod service;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{DateKey, MoodError, MoodRecord, Ratings};

// =============================================================================
// RE-EXPORTS: Schema, Store, Aggregation, Service
// =============================================================================

pub use aggregate::{
    DayView, DimensionInsight, HistoryEntry, TrendDirection, Week, average_of, calendar_grid,
    dimension_insights, trend,
};
pub use formats::{ExportDocument, MoodDocument};
pub use schema::{DIMENSIONS, Dimension, neutral_record};
pub use service::{Clock, FixedClock, ImportSummary, MoodService, SubmitAck, SystemClock};
pub use store::{BackendKind, InMemoryStore, JsonFileStore, MoodStore, RedbStore, StorageBackend};
