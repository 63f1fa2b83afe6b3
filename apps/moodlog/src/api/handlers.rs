//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads take the service read lock; writes take the write lock so no two
//! read-modify-write cycles on the backing document interleave.

use super::{
    AppState,
    types::{
        DeleteResponse, HealthResponse, HistoryQuery, InsightsResponse, MoodEntryResponse,
        SubmitRequest, UpsertRequest, WindowQuery, bad_request, error_response,
    },
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use moodlog_core::{DIMENSIONS, DateKey, MoodError, primitives::MIN_INSIGHT_DAYS};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// MOOD COLLECTION HANDLERS
// =============================================================================

/// Every stored record as `{date: record}`.
pub async fn list_moods_handler(State(state): State<AppState>) -> Response {
    let service = state.service.read().await;
    match service.list_all() {
        Ok(moods) => Json(moods).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Full-store export envelope.
pub async fn export_handler(State(state): State<AppState>) -> Response {
    let service = state.service.read().await;
    match service.export() {
        Ok(export) => {
            tracing::info!(records = export.moods.len(), "Export served");
            Json(export).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Record for one date.
pub async fn get_mood_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Response {
    let key = match DateKey::parse(&date) {
        Ok(key) => key,
        Err(e) => return error_response(&e),
    };

    let service = state.service.read().await;
    match service.get(&date) {
        Ok(Some(data)) => Json(MoodEntryResponse { date: key, data }).into_response(),
        Ok(None) => error_response(&MoodError::NotFound(key)),
        Err(e) => error_response(&e),
    }
}

/// Create or replace the record for an arbitrary date.
pub async fn upsert_mood_handler(
    State(state): State<AppState>,
    payload: Result<Json<UpsertRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let (date, ratings) = match request.into_parts() {
        Ok(parts) => parts,
        Err(msg) => return bad_request(msg),
    };

    let mut service = state.service.write().await;
    match service.upsert(&date, &ratings) {
        Ok(ack) => Json(MoodEntryResponse::from(ack)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Delete the record for one date.
pub async fn delete_mood_handler(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Response {
    let key = match DateKey::parse(&date) {
        Ok(key) => key,
        Err(e) => return error_response(&e),
    };

    let mut service = state.service.write().await;
    match service.remove(&date) {
        Ok(_) => Json(DeleteResponse::deleted(key)).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// TODAY HANDLERS
// =============================================================================

/// Today's record; neutral when nothing is logged yet.
pub async fn today_handler(State(state): State<AppState>) -> Response {
    let service = state.service.read().await;
    match service.fetch_today() {
        Ok(data) => Json(MoodEntryResponse {
            date: service.today(),
            data,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Store ratings as today's record.
pub async fn submit_today_handler(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let ratings = match payload {
        Ok(Json(SubmitRequest { data: Some(data) })) => data,
        Ok(Json(SubmitRequest { data: None })) => return bad_request("Data is required"),
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let mut service = state.service.write().await;
    match service.submit(&ratings) {
        Ok(ack) => Json(MoodEntryResponse::from(ack)).into_response(),
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// DERIVED VIEW HANDLERS
// =============================================================================

/// Most recent records first.
pub async fn history_handler(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let limit = query.limit.unwrap_or(state.history_limit);
    let service = state.service.read().await;
    match service.fetch_history(limit) {
        Ok(history) => Json(history).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Calendar grid ending today.
pub async fn calendar_handler(
    State(state): State<AppState>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let weeks = query.weeks.unwrap_or(state.calendar_weeks);
    let service = state.service.read().await;
    match service.calendar(weeks) {
        Ok(grid) => Json(grid).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Per-dimension averages and trends over the rolling window.
pub async fn insights_handler(
    State(state): State<AppState>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return bad_request(rejection.body_text()),
    };
    let weeks = query.weeks.unwrap_or(state.calendar_weeks);
    let service = state.service.read().await;
    match service.insights(weeks) {
        Ok(insights) => Json(InsightsResponse {
            ready: insights.is_some(),
            min_days: MIN_INSIGHT_DAYS,
            weeks,
            dimensions: insights.unwrap_or_default(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// The fixed dimension schema, in display order.
pub async fn dimensions_handler() -> impl IntoResponse {
    Json(DIMENSIONS)
}
