//! # Persistence Format
//!
//! The JSON document backing the file store, and the export envelope.
//!
//! Store document:
//!
//! ```json
//! { "version": "1.0", "moods": { "2024-03-09": { "overall": 1, ... } } }
//! ```
//!
//! Export envelope:
//!
//! ```json
//! { "exportDate": "2024-03-09T21:14:03.120Z", "moods": { ... }, "version": "1.0" }
//! ```
//!
//! These are pure transformations; file I/O lives in the store.
//!
//! ## Validation
//!
//! - Size is checked before parsing (`MAX_DOCUMENT_SIZE`)
//! - Every key must be a `DateKey` and every value a complete `MoodRecord`
//!   (enforced by their `Deserialize` impls)
//! - A document without `version` predates the tag and is read as current;
//!   any other version is rejected

use crate::primitives::{FORMAT_VERSION, MAX_DOCUMENT_SIZE};
use crate::{DateKey, MoodError, MoodRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// STORE DOCUMENT
// =============================================================================

/// The single document holding every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodDocument {
    #[serde(default = "current_version")]
    pub version: String,
    #[serde(default)]
    pub moods: BTreeMap<DateKey, MoodRecord>,
}

fn current_version() -> String {
    FORMAT_VERSION.to_string()
}

impl MoodDocument {
    /// Empty document tagged with the current version.
    #[must_use]
    pub fn new() -> Self {
        Self::with_moods(BTreeMap::new())
    }

    /// Document holding the given records.
    #[must_use]
    pub fn with_moods(moods: BTreeMap<DateKey, MoodRecord>) -> Self {
        Self {
            version: current_version(),
            moods,
        }
    }

    /// Check the version tag.
    pub fn validate(&self) -> Result<(), MoodError> {
        if self.version != FORMAT_VERSION {
            return Err(MoodError::StorageFailure(format!(
                "Unsupported document version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }
}

impl Default for MoodDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a document to pretty-printed JSON bytes.
pub fn document_to_bytes(document: &MoodDocument) -> Result<Vec<u8>, MoodError> {
    let mut bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| MoodError::SerializationError(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parse and validate a document.
///
/// Corruption (bad JSON, malformed keys, incomplete records, unknown
/// version) is a `StorageFailure`: the caller never sees a partial store.
pub fn document_from_bytes(bytes: &[u8]) -> Result<MoodDocument, MoodError> {
    if bytes.len() as u64 > MAX_DOCUMENT_SIZE {
        return Err(MoodError::StorageFailure(format!(
            "Document size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_DOCUMENT_SIZE
        )));
    }

    let document: MoodDocument = serde_json::from_slice(bytes).map_err(|e| {
        MoodError::StorageFailure(format!("Failed to parse mood document: {}", e))
    })?;
    document.validate()?;

    Ok(document)
}

// =============================================================================
// EXPORT DOCUMENT
// =============================================================================

/// Full-store export, stamped with the time it was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// RFC 3339 UTC timestamp of the export, millisecond precision.
    pub export_date: String,
    pub moods: BTreeMap<DateKey, MoodRecord>,
    pub version: String,
}

impl ExportDocument {
    /// Build an export of `moods` taken at `now`.
    #[must_use]
    pub fn new(moods: BTreeMap<DateKey, MoodRecord>, now: DateTime<Utc>) -> Self {
        Self {
            export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            moods,
            version: current_version(),
        }
    }
}

/// Parse an import file.
///
/// Accepts either an export envelope or a raw store document, since both
/// carry `moods` and `version`.
pub fn import_from_bytes(bytes: &[u8]) -> Result<MoodDocument, MoodError> {
    if bytes.len() as u64 > MAX_DOCUMENT_SIZE {
        return Err(MoodError::InvalidRecord(format!(
            "Import size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_DOCUMENT_SIZE
        )));
    }

    // Unknown fields (exportDate) are ignored by MoodDocument.
    let document: MoodDocument = serde_json::from_slice(bytes)
        .map_err(|e| MoodError::InvalidRecord(format!("Unreadable import: {}", e)))?;
    if document.version != FORMAT_VERSION {
        return Err(MoodError::InvalidRecord(format!(
            "Unsupported import version: {}",
            document.version
        )));
    }
    Ok(document)
}

// =============================================================================
// TESTS
// =============================================================================
