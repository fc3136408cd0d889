//! Skyline stats and the global reset.
//!
//! The bundled client lights buildings through `/api/illuminate` and reads
//! its progress from `/api/stats`, so the building pool is the model counted
//! there. Window-light counts live under `/api/stats/windows`.

use super::error::ApiError;
use super::AppState;
use crate::stats::SkylineStats;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// `GET /api/stats` — building pool counts, recomputed on every call.
pub(super) async fn handler_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SkylineStats>, ApiError> {
    Ok(Json(state.storage.building_stats().await?))
}

/// `GET /api/stats/windows` — window-light counts against `total_windows`.
pub(super) async fn handler_window_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SkylineStats>, ApiError> {
    Ok(Json(state.storage.light_stats().await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ResetResponse {
    message: &'static str,
    cleared_lights: u64,
    cleared_buildings: u64,
}

/// `POST /api/reset` — clear every light and return every building to unlit.
pub(super) async fn handler_reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, ApiError> {
    let cleared_lights = state.storage.reset_lights().await?;
    let cleared_buildings = state.storage.reset_buildings().await?;
    state.prom_metrics.resets.inc();
    info!(cleared_lights, cleared_buildings, "skyline reset");
    Ok(Json(ResetResponse {
        message: "Skyline reset successfully",
        cleared_lights,
        cleared_buildings,
    }))
}
