//! # API — HTTP Server
//!
//! Runs an Axum HTTP server exposing the window-light and building-pool
//! endpoints as JSON, plus health probes and Prometheus metrics. An optional
//! static directory (the built client bundle) is served as the fallback.

mod error;
mod routes_buildings;
mod routes_health;
mod routes_lights;
mod routes_stats;

pub use error::ApiError;

use crate::config::SkylineConfig;
use crate::prom_metrics;
use crate::store::Storage;
use anyhow::Result;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, Instrument};

const MAX_BODY_BYTES: usize = 64 * 1024;

pub struct AppState {
    pub storage: Storage,
    pub config: SkylineConfig,
    pub prom_metrics: prom_metrics::Metrics,
}

impl AppState {
    pub fn new(storage: Storage, config: SkylineConfig) -> Arc<Self> {
        Arc::new(AppState {
            storage,
            config,
            prom_metrics: prom_metrics::Metrics::new(),
        })
    }

    /// Count a refused request and hand the error back to the caller.
    pub(super) fn reject(&self, err: ApiError) -> ApiError {
        if let Some(reason) = err.reason() {
            self.prom_metrics.record_rejection(reason);
            debug!(reason, error = %err, "request rejected");
        }
        err
    }
}

/// Records request duration, assigns (or propagates) an `x-request-id`, and
/// runs the request inside a tracing span carrying that id.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Collapse per-entity path segments into placeholders so histogram labels
/// stay bounded.
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    segments
        .iter()
        .enumerate()
        .map(|(i, seg)| {
            let parent = if i > 0 { segments[i - 1] } else { "" };
            match (parent, *seg) {
                ("lights", s) if !s.is_empty() => ":window_id",
                ("buildings", s) if !s.is_empty() && s != "stats" => ":id",
                (_, s) => s,
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn build_router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let mut app = Router::new()
        .route(
            "/api/lights",
            get(routes_lights::handler_lights_list).post(routes_lights::handler_lights_create),
        )
        .route(
            "/api/lights/{window_id}",
            get(routes_lights::handler_light_get),
        )
        .route("/api/stats", get(routes_stats::handler_stats))
        .route("/api/stats/windows", get(routes_stats::handler_window_stats))
        .route("/api/reset", post(routes_stats::handler_reset))
        .route(
            "/api/buildings",
            get(routes_buildings::handler_buildings_list),
        )
        .route(
            "/api/buildings/stats",
            get(routes_buildings::handler_buildings_stats),
        )
        .route(
            "/api/buildings/{id}",
            get(routes_buildings::handler_building_get),
        )
        .route(
            "/api/buildings/{id}/illuminate",
            post(routes_buildings::handler_illuminate_one),
        )
        .route(
            "/api/illuminate",
            post(routes_buildings::handler_illuminate_any),
        )
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(CatchPanicLayer::new())
    .layer(axum::middleware::from_fn_with_state(
        state.clone(),
        metrics_middleware,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
    .layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(30),
    ))
    .with_state(state)
}

pub async fn run(
    storage: Storage,
    config: SkylineConfig,
    port: u16,
    static_dir: Option<&Path>,
) -> Result<()> {
    let state = AppState::new(storage, config);
    let backend = state.storage.backend_name();
    let app = build_router(state, static_dir);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, backend, "skyline api running");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("skyline api shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(_) => {
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_preserves_collection_routes() {
        assert_eq!(normalize_path("/api/lights"), "/api/lights");
        assert_eq!(normalize_path("/api/buildings"), "/api/buildings");
        assert_eq!(normalize_path("/api/buildings/stats"), "/api/buildings/stats");
        assert_eq!(normalize_path("/api/stats/windows"), "/api/stats/windows");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn normalize_path_collapses_ids() {
        assert_eq!(normalize_path("/api/lights/42"), "/api/lights/:window_id");
        assert_eq!(normalize_path("/api/lights/b4-3-2"), "/api/lights/:window_id");
        assert_eq!(
            normalize_path("/api/buildings/b6/illuminate"),
            "/api/buildings/:id/illuminate"
        );
    }

    #[test]
    fn normalize_path_handles_empty_and_root() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "");
    }
}
