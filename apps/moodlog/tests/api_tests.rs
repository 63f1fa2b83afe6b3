//! Integration tests for the Moodlog HTTP API.
//!
//! Uses axum-test to exercise the router without binding a socket.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await - env-dependent tests are serialized
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use moodlog::api::{
    API_KEY_ENV, AppState, DeleteResponse, ErrorResponse, HealthResponse, MoodEntryResponse,
    RATE_LIMIT_ENV, create_router,
};
use moodlog_core::{DateKey, FixedClock, MoodRecord, MoodService, StorageBackend};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Serializes tests because the router reads its security knobs from env vars.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const TODAY: &str = "2024-03-13";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Holds the env mutex and clears the env vars on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        clear_env();
    }
}

fn clear_env() {
    // SAFETY: every test touching these vars holds ENV_MUTEX.
    unsafe {
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(RATE_LIMIT_ENV);
    }
}

fn lock_env() -> TestGuard {
    let guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    TestGuard { _guard: guard }
}

fn service_on(today: &str) -> MoodService {
    let date = DateKey::parse(today).unwrap().date();
    MoodService::new(StorageBackend::in_memory(), FixedClock::on(date))
}

fn server_for(service: MoodService) -> TestServer {
    TestServer::new(create_router(AppState::new(service))).unwrap()
}

/// Fresh in-memory server whose clock reads 2024-03-13.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env();
    (server_for(service_on(TODAY)), guard)
}

fn full_record(values: [i64; 6]) -> Value {
    json!({
        "overall": values[0],
        "home": values[1],
        "work": values[2],
        "health": values[3],
        "sleep": values[4],
        "social": values[5],
    })
}

async fn post_mood(server: &TestServer, date: &str, values: [i64; 6]) {
    server
        .post("/api/moods")
        .json(&json!({ "date": date, "data": full_record(values) }))
        .await
        .assert_status_ok();
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// MOOD COLLECTION TESTS
// =============================================================================

#[tokio::test]
async fn test_list_empty_store() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/moods").await;

    response.assert_status_ok();
    let moods: BTreeMap<String, Value> = response.json();
    assert!(moods.is_empty());
}

#[tokio::test]
async fn test_upsert_then_get() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/moods")
        .json(&json!({ "date": "2024-03-10", "data": full_record([1, 2, -1, 0, 1, 2]) }))
        .await;
    response.assert_status_ok();
    let saved: MoodEntryResponse = response.json();
    assert_eq!(saved.date.to_string(), "2024-03-10");
    assert_eq!(saved.data.get("home"), Some(2));

    let response = server.get("/api/moods/2024-03-10").await;
    response.assert_status_ok();
    let fetched: MoodEntryResponse = response.json();
    assert_eq!(fetched, saved);
}

#[tokio::test]
async fn test_list_is_keyed_by_date_in_order() {
    let (server, _guard) = create_test_server();
    post_mood(&server, "2024-03-12", [0; 6]).await;
    post_mood(&server, "2024-03-01", [1; 6]).await;

    let moods: BTreeMap<String, MoodRecord> = server.get("/api/moods").await.json();
    let keys: Vec<_> = moods.keys().cloned().collect();
    assert_eq!(keys, vec!["2024-03-01", "2024-03-12"]);
}

#[tokio::test]
async fn test_second_upsert_wins() {
    let (server, _guard) = create_test_server();
    post_mood(&server, "2024-03-10", [2; 6]).await;
    post_mood(&server, "2024-03-10", [-2; 6]).await;

    let fetched: MoodEntryResponse = server.get("/api/moods/2024-03-10").await.json();
    assert_eq!(fetched.data.average(), -2.0);
}

#[tokio::test]
async fn test_get_missing_is_404() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/moods/2024-03-10").await;

    response.assert_status_not_found();
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Mood not found for this date");
}

#[tokio::test]
async fn test_get_malformed_date_is_400() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/moods/2024-3-10").await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Invalid date format. Use YYYY-MM-DD");
}

#[tokio::test]
async fn test_upsert_missing_fields_is_400() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/moods")
        .json(&json!({ "date": "2024-03-10" }))
        .await;
    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert_eq!(body.error, "Date and data are required");

    let response = server
        .post("/api/moods")
        .json(&json!({ "data": full_record([0; 6]) }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_upsert_malformed_date_is_400_and_store_unchanged() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/moods")
        .json(&json!({ "date": "10/03/2024", "data": full_record([0; 6]) }))
        .await;
    response.assert_status_bad_request();

    let moods: BTreeMap<String, Value> = server.get("/api/moods").await.json();
    assert!(moods.is_empty());
}

#[tokio::test]
async fn test_upsert_incomplete_record_is_400() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/moods")
        .json(&json!({ "date": "2024-03-10", "data": { "overall": 1 } }))
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(body.error.contains("Invalid mood record"));
}

#[tokio::test]
async fn test_upsert_out_of_range_is_400() {
    let (server, _guard) = create_test_server();

    let mut data = full_record([0; 6]);
    data["sleep"] = json!(3);
    let response = server
        .post("/api/moods")
        .json(&json!({ "date": "2024-03-10", "data": data }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_upsert_unknown_dimension_is_400() {
    let (server, _guard) = create_test_server();

    let mut data = full_record([0; 6]);
    data["weather"] = json!(1);
    let response = server
        .post("/api/moods")
        .json(&json!({ "date": "2024-03-10", "data": data }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_invalid_json_body_is_400() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/moods")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    response.assert_status_bad_request();
    let body: ErrorResponse = response.json();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_delete_then_get_is_404() {
    let (server, _guard) = create_test_server();
    post_mood(&server, "2024-03-10", [1; 6]).await;

    let response = server.delete("/api/moods/2024-03-10").await;
    response.assert_status_ok();
    let body: DeleteResponse = response.json();
    assert_eq!(body.message, "Mood deleted");
    assert_eq!(body.date.to_string(), "2024-03-10");

    server
        .get("/api/moods/2024-03-10")
        .await
        .assert_status_not_found();
    server
        .delete("/api/moods/2024-03-10")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_delete_malformed_date_is_400() {
    let (server, _guard) = create_test_server();

    server
        .delete("/api/moods/yesterday")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_export_envelope() {
    let (server, _guard) = create_test_server();
    post_mood(&server, "2024-03-10", [1, 1, 1, 1, 1, 1]).await;

    let response = server.get("/api/moods/export/all").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["version"], "1.0");
    assert_eq!(body["exportDate"], "2024-03-13T12:00:00.000Z");
    assert_eq!(body["moods"]["2024-03-10"]["overall"], 1);
}

// =============================================================================
// TODAY TESTS
// =============================================================================

#[tokio::test]
async fn test_today_defaults_to_neutral() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/today").await;

    response.assert_status_ok();
    let today: MoodEntryResponse = response.json();
    assert_eq!(today.date.to_string(), TODAY);
    assert_eq!(today.data, MoodRecord::neutral());
}

#[tokio::test]
async fn test_submit_today_then_history() {
    let (server, _guard) = create_test_server();
    post_mood(&server, "2024-03-12", [-1; 6]).await;

    let response = server
        .post("/api/today")
        .json(&json!({ "data": full_record([1, 2, -1, 0, 1, 2]) }))
        .await;
    response.assert_status_ok();
    let ack: MoodEntryResponse = response.json();
    assert_eq!(ack.date.to_string(), TODAY);

    let response = server.get("/api/history").add_query_param("limit", 10).await;
    response.assert_status_ok();
    let history: Vec<MoodEntryResponse> = response.json();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0], ack);
    assert_eq!(history[1].date.to_string(), "2024-03-12");
}

#[tokio::test]
async fn test_submit_today_without_data_is_400() {
    let (server, _guard) = create_test_server();

    server
        .post("/api/today")
        .json(&json!({}))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_history_limit() {
    let (server, _guard) = create_test_server();
    for day in ["2024-03-01", "2024-03-02", "2024-03-03"] {
        post_mood(&server, day, [0; 6]).await;
    }

    let history: Vec<MoodEntryResponse> = server
        .get("/api/history")
        .add_query_param("limit", 2)
        .await
        .json();

    let dates: Vec<String> = history.iter().map(|e| e.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-03-03", "2024-03-02"]);
}

// =============================================================================
// CALENDAR / INSIGHTS / DIMENSIONS TESTS
// =============================================================================

#[tokio::test]
async fn test_calendar_default_window() {
    let (server, _guard) = create_test_server();
    post_mood(&server, TODAY, [2, -2, 0, 0, 0, 0]).await;
    post_mood(&server, "2024-03-15", [2; 6]).await;

    let response = server.get("/api/calendar").await;

    response.assert_status_ok();
    let grid: Vec<Vec<Value>> = response.json();
    assert_eq!(grid.len(), 12);
    assert!(grid.iter().all(|week| week.len() == 7));
    assert_eq!(grid[0][0]["date"], "2023-12-24");
    assert_eq!(grid[11][6]["date"], "2024-03-16");

    let today = &grid[11][3];
    assert_eq!(today["isToday"], true);
    assert_eq!(today["avg"], 0.0);

    let friday = &grid[11][5];
    assert_eq!(friday["isFuture"], true);
    assert_eq!(friday["data"], Value::Null);
    assert_eq!(friday["avg"], Value::Null);
}

#[tokio::test]
async fn test_calendar_rejects_zero_weeks() {
    let (server, _guard) = create_test_server();

    server
        .get("/api/calendar")
        .add_query_param("weeks", 0)
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_malformed_query_is_400_with_error_body() {
    let (server, _guard) = create_test_server();

    for (path, param, value) in [
        ("/api/history", "limit", "abc"),
        ("/api/calendar", "weeks", "-1"),
        ("/api/insights", "weeks", "many"),
    ] {
        let response = server.get(path).add_query_param(param, value).await;
        response.assert_status_bad_request();
        let body: ErrorResponse = response.json();
        assert!(!body.error.is_empty(), "{} returned an empty error", path);
    }
}

#[tokio::test]
async fn test_insights_not_ready_with_few_days() {
    let (server, _guard) = create_test_server();
    post_mood(&server, TODAY, [1; 6]).await;

    let body: Value = server.get("/api/insights").await.json();

    assert_eq!(body["ready"], false);
    assert_eq!(body["min_days"], 3);
    assert_eq!(body["dimensions"], json!([]));
}

#[tokio::test]
async fn test_insights_report_improving_trend() {
    let (server, _guard) = create_test_server();
    // Most recent three days high, earliest three low.
    let days = [
        ("2024-03-13", 2),
        ("2024-03-12", 2),
        ("2024-03-11", 2),
        ("2024-03-10", 0),
        ("2024-03-09", -2),
        ("2024-03-08", -2),
        ("2024-03-07", -2),
    ];
    for (date, overall) in days {
        post_mood(&server, date, [overall, 0, 0, 0, 0, 0]).await;
    }

    let body: Value = server.get("/api/insights").await.json();

    assert_eq!(body["ready"], true);
    let overall = &body["dimensions"][0];
    assert_eq!(overall["dimension"]["id"], "overall");
    assert_eq!(overall["trend"], 4.0);
    assert_eq!(overall["direction"], "improving");
    assert_eq!(body["dimensions"][1]["direction"], "steady");
}

#[tokio::test]
async fn test_dimensions_schema() {
    let (server, _guard) = create_test_server();

    let body: Vec<Value> = server.get("/api/dimensions").await.json();

    let ids: Vec<&str> = body.iter().filter_map(|d| d["id"].as_str()).collect();
    assert_eq!(ids, vec!["overall", "home", "work", "health", "sleep", "social"]);
    assert_eq!(body[1]["left"], "Conflict");
    assert_eq!(body[1]["right"], "Harmony");
}

// =============================================================================
// ROUTING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    server.get("/unknown").await.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    let response = server.post("/health").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// FILE BACKEND
// =============================================================================

#[tokio::test]
async fn test_file_backend_persists_across_routers() {
    let _guard = lock_env();
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("data").join("db.json");
    let today = DateKey::parse(TODAY).unwrap().date();

    let store = StorageBackend::open(Default::default(), &path).unwrap();
    let server = server_for(MoodService::new(store, FixedClock::on(today)));
    post_mood(&server, "2024-03-10", [1, 0, 0, 0, 0, -1]).await;
    drop(server);

    let store = StorageBackend::open(Default::default(), &path).unwrap();
    let server = server_for(MoodService::new(store, FixedClock::on(today)));
    let fetched: MoodEntryResponse = server.get("/api/moods/2024-03-10").await.json();
    assert_eq!(fetched.data.get("social"), Some(-1));

    let raw: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(raw["version"], "1.0");
    assert_eq!(raw["moods"]["2024-03-10"]["overall"], 1);
}

#[tokio::test]
async fn test_corrupt_file_backend_is_500_not_empty() {
    let _guard = lock_env();
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("db.json");
    let today = DateKey::parse(TODAY).unwrap().date();

    let store = StorageBackend::open(Default::default(), &path).unwrap();
    let server = server_for(MoodService::new(store, FixedClock::on(today)));
    post_mood(&server, "2024-03-10", [1, 0, 0, 0, 0, -1]).await;

    std::fs::write(&path, b"{ \"moods\": { \"2024-03-10\": ").unwrap();

    for path in ["/api/moods", "/api/history", "/api/today", "/api/moods/export/all"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = response.json();
        assert!(!body.error.is_empty(), "{} returned an empty error", path);
    }
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let _guard = lock_env();
    // SAFETY: ENV_MUTEX is held.
    unsafe { std::env::set_var(RATE_LIMIT_ENV, "1") };
    let server = server_for(service_on(TODAY));

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_zero_disables() {
    let _guard = lock_env();
    // SAFETY: ENV_MUTEX is held.
    unsafe { std::env::set_var(RATE_LIMIT_ENV, "0") };
    let server = server_for(service_on(TODAY));

    for _ in 0..150 {
        server.get("/health").await.assert_status_ok();
    }
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Server with `MOODLOG_API_KEY` set. The caller holds the env guard.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: ENV_MUTEX is held by the caller.
    unsafe { std::env::set_var(API_KEY_ENV, api_key) };
    server_for(service_on(TODAY))
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse().unwrap()
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let _guard = lock_env();
    let server = create_auth_test_server("test-secret-key-12345");

    let response = server
        .get("/api/moods")
        .add_header(header::AUTHORIZATION, bearer("test-secret-key-12345"))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let _guard = lock_env();
    let server = create_auth_test_server("test-raw-key-67890");

    let response = server
        .get("/api/today")
        .add_header(
            header::AUTHORIZATION,
            "test-raw-key-67890".parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = lock_env();
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/api/moods")
        .add_header(header::AUTHORIZATION, bearer("wrong-key"))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = lock_env();
    let server = create_auth_test_server("required-key");

    server.get("/api/moods").await.assert_status_unauthorized();
    server
        .post("/api/moods")
        .json(&json!({ "date": TODAY, "data": full_record([0; 6]) }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let _guard = lock_env();
    let server = create_auth_test_server("actual-key");

    let response = server
        .get("/api/moods")
        .add_header(header::AUTHORIZATION, "Bearer ".parse::<HeaderValue>().unwrap())
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = lock_env();
    let server = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}
