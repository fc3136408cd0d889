//! Shared test helpers for integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use skyline::api::{build_router, AppState};
use skyline::config::SkylineConfig;
use skyline::db::Database;
use skyline::store::Storage;
use tower::ServiceExt;

/// Returns the test database URL from the `TEST_DATABASE_URL` environment variable.
/// Panics if the variable is not set.
pub fn test_db_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// Returns true if the test database URL is configured.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// Router over a fresh in-memory store with the default config.
pub fn build_memory_app() -> Router {
    build_memory_app_with(SkylineConfig::default())
}

pub fn build_memory_app_with(config: SkylineConfig) -> Router {
    let storage = Storage::in_memory(&config);
    build_router(AppState::new(storage, config), None)
}

/// Connect to the test database, apply the schema and seed the default
/// catalog, then clear all illumination state.
pub async fn setup_test_storage(config: &SkylineConfig) -> Storage {
    let db = Database::connect(&test_db_url())
        .await
        .expect("Failed to connect to test database");
    truncate_all_tables(&db).await;
    Storage::postgres(db, config)
        .await
        .expect("Failed to migrate test database")
}

/// Router backed by the test database.
pub async fn build_test_app() -> Router {
    let config = SkylineConfig::default();
    let storage = setup_test_storage(&config).await;
    build_router(AppState::new(storage, config), None)
}

/// Drop all skyline rows so each test starts clean.
pub async fn truncate_all_tables(db: &Database) {
    sqlx::raw_sql(
        "DO $$ BEGIN
           IF to_regclass('public.lights') IS NOT NULL THEN TRUNCATE TABLE lights; END IF;
           IF to_regclass('public.buildings') IS NOT NULL THEN TRUNCATE TABLE buildings; END IF;
         END $$;",
    )
    .execute(db.pool())
    .await
    .unwrap();
}

/// Sends a GET request and returns the status code and parsed JSON body
/// (`null` when the body is not JSON).
pub async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::json!(null));
    (status, json)
}

/// Sends a POST request with a JSON body and returns the status code and parsed response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    post_raw(app, uri, &body.to_string()).await
}

/// Sends a POST request with an arbitrary (possibly malformed) JSON body.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null));
    (status, json)
}
