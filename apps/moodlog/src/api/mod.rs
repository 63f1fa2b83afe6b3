//! # Moodlog HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /api/moods` - Every record, keyed by date
//! - `GET /api/moods/export/all` - Export envelope `{exportDate, moods, version}`
//! - `GET /api/moods/{date}` - One record
//! - `POST /api/moods` - Create or replace a record `{date, data}`
//! - `DELETE /api/moods/{date}` - Delete a record
//! - `GET|POST /api/today` - Today's record / submit today's ratings
//! - `GET /api/history?limit=N` - Most recent records first
//! - `GET /api/calendar?weeks=N` - Sunday-aligned calendar grid
//! - `GET /api/insights?weeks=N` - Per-dimension averages and trends
//! - `GET /api/dimensions` - The dimension schema
//! - `GET /health` - Health check
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `MOODLOG_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `MOODLOG_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `MOODLOG_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    DeleteResponse, ErrorResponse, HealthResponse, HistoryQuery, InsightsResponse,
    MoodEntryResponse, SubmitRequest, UpsertRequest, WindowQuery, error_response, status_for,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::get,
};
use crate::error::AppError;
use moodlog_core::{
    MoodService,
    primitives::{DEFAULT_CALENDAR_WEEKS, DEFAULT_HISTORY_LIMIT},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body. A mood record is a few hundred bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Environment variable holding the CORS allow-list.
pub const CORS_ORIGINS_ENV: &str = "MOODLOG_CORS_ORIGINS";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The facade over the configured store.
    pub service: Arc<RwLock<MoodService>>,
    /// Window used by `/api/calendar` and `/api/insights` without `?weeks=`.
    pub calendar_weeks: u32,
    /// Limit used by `/api/history` without `?limit=`.
    pub history_limit: usize,
}

impl AppState {
    /// Wrap `service` with the default window and history limit.
    #[must_use]
    pub fn new(service: MoodService) -> Self {
        Self {
            service: Arc::new(RwLock::new(service)),
            calendar_weeks: DEFAULT_CALENDAR_WEEKS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Override the defaults applied when a request leaves them out.
    #[must_use]
    pub fn with_defaults(mut self, calendar_weeks: u32, history_limit: usize) -> Self {
        self.calendar_weeks = calendar_weeks;
        self.history_limit = history_limit;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

/// Build the CORS layer from `MOODLOG_CORS_ORIGINS`.
///
/// - `*`: any origin
/// - unset: localhost only
/// - otherwise: the comma-separated list, skipping entries that are not valid
///   header values
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ORIGINS_ENV).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins ({}=*). Do not expose this server publicly.",
                CORS_ORIGINS_ENV
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in {}, defaulting to localhost only",
                    CORS_ORIGINS_ENV
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!(
                "CORS: No {} set, defaulting to localhost only",
                CORS_ORIGINS_ENV
            );
            build_localhost_cors()
        }
    }
}

/// CORS for the usual local front-end dev servers.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3001",
        "http://localhost:5173",
        "http://127.0.0.1:3001",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
///
/// `/api/moods/export/all` is a fixed two-segment path, so it never collides
/// with the single-segment `/api/moods/{date}`.
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication disabled; set {} to require a key",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/moods",
            get(handlers::list_moods_handler).post(handlers::upsert_mood_handler),
        )
        .route("/api/moods/export/all", get(handlers::export_handler))
        .route(
            "/api/moods/{date}",
            get(handlers::get_mood_handler).delete(handlers::delete_mood_handler),
        )
        .route(
            "/api/today",
            get(handlers::today_handler).post(handlers::submit_today_handler),
        )
        .route("/api/history", get(handlers::history_handler))
        .route("/api/calendar", get(handlers::calendar_handler))
        .route("/api/insights", get(handlers::insights_handler))
        .route("/api/dimensions", get(handlers::dimensions_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until Ctrl+C.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), AppError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Bind failed on {}: {}", addr, e)))?;

    tracing::info!("Moodlog HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
