//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API and the single
//! place where `MoodError` is mapped to a status code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use moodlog_core::{DateKey, DimensionInsight, MoodError, MoodRecord, Ratings, SubmitAck};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every non-2xx response produced by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Status code for a core error.
///
/// Invalid input is the caller's fault (400), a missing record is 404, and
/// anything that went wrong below the facade is a 500.
pub fn status_for(err: &MoodError) -> StatusCode {
    match err {
        MoodError::InvalidDate(_) | MoodError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
        MoodError::NotFound(_) => StatusCode::NOT_FOUND,
        MoodError::StorageFailure(_) | MoodError::SerializationError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Convert a core error into a `{"error": ...}` response.
pub fn error_response(err: &MoodError) -> Response {
    let status = status_for(err);
    let message = match err {
        MoodError::InvalidDate(_) => "Invalid date format. Use YYYY-MM-DD".to_string(),
        MoodError::NotFound(_) => "Mood not found for this date".to_string(),
        other => other.to_string(),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "Request rejected");
    }

    (status, Json(ErrorResponse::new(message))).into_response()
}

/// 400 response for a body or query string that could not be decoded.
pub fn bad_request(msg: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
}

// =============================================================================
// MOOD ENTRY
// =============================================================================

/// One stored day: `{date, data}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntryResponse {
    pub date: DateKey,
    pub data: MoodRecord,
}

impl From<SubmitAck> for MoodEntryResponse {
    fn from(ack: SubmitAck) -> Self {
        Self {
            date: ack.date,
            data: ack.data,
        }
    }
}

// =============================================================================
// UPSERT / SUBMIT REQUESTS
// =============================================================================

/// Create-or-replace request for an arbitrary date.
///
/// Both fields are optional at the decoding step so that a missing one can be
/// reported as a 400 with a readable message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertRequest {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub data: Option<Ratings>,
}

impl UpsertRequest {
    /// Both fields, or the message for the 400 response.
    pub fn into_parts(self) -> Result<(String, Ratings), &'static str> {
        match (self.date, self.data) {
            (Some(date), Some(data)) if !date.is_empty() => Ok((date, data)),
            _ => Err("Date and data are required"),
        }
    }
}

/// Ratings for today.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub data: Option<Ratings>,
}

// =============================================================================
// DELETE RESPONSE
// =============================================================================

/// Delete acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub date: DateKey,
}

impl DeleteResponse {
    pub fn deleted(date: DateKey) -> Self {
        Self {
            message: "Mood deleted".to_string(),
            date,
        }
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// `?limit=N` for the history endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// `?weeks=N` for the calendar and insights endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WindowQuery {
    pub weeks: Option<u32>,
}

// =============================================================================
// INSIGHTS RESPONSE
// =============================================================================

/// Per-dimension insights over the rolling window.
///
/// `ready` is false, and `dimensions` empty, until `min_days` days are logged
/// inside the window.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsResponse {
    pub ready: bool,
    pub min_days: usize,
    pub weeks: u32,
    pub dimensions: Vec<DimensionInsight>,
}
