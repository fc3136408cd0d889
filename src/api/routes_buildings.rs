//! # Building Pool API
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /api/buildings` | Catalog with current lit state |
//! | `GET /api/buildings/stats` | Lit / total / available buildings |
//! | `GET /api/buildings/{id}` | Single building |
//! | `POST /api/illuminate` | Light a random unlit building |
//! | `POST /api/buildings/{id}/illuminate` | Light a chosen building |

use super::error::ApiError;
use super::AppState;
use crate::model::Building;
use crate::stats::SkylineStats;
use crate::validate;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub(super) async fn handler_buildings_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Building>>, ApiError> {
    Ok(Json(state.storage.list_buildings().await?))
}

pub(super) async fn handler_buildings_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SkylineStats>, ApiError> {
    Ok(Json(state.storage.building_stats().await?))
}

pub(super) async fn handler_building_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Building>, ApiError> {
    match state.storage.get_building(&id).await? {
        Some(building) => Ok(Json(building)),
        None => Err(state.reject(ApiError::NotFound(format!(
            "Building {} not found",
            id
        )))),
    }
}

/// `POST /api/illuminate` — the service picks the building.
pub(super) async fn handler_illuminate_any(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Building>, ApiError> {
    let Json(body) = payload.map_err(|e| state.reject(e.into()))?;
    let req = validate::validate_illuminate(&body).map_err(|e| state.reject(e.into()))?;
    let building = state
        .storage
        .illuminate_any(&req.name, &req.goal)
        .await
        .map_err(|e| state.reject(e.into()))?;

    state.prom_metrics.record_illumination("building");
    info!(building = %building.id, owner = %req.name, "building lit");
    Ok(Json(building))
}

/// `POST /api/buildings/{id}/illuminate` — the visitor picks the building.
pub(super) async fn handler_illuminate_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Building>, ApiError> {
    let Json(body) = payload.map_err(|e| state.reject(e.into()))?;
    let req = validate::validate_illuminate(&body).map_err(|e| state.reject(e.into()))?;
    let building = state
        .storage
        .illuminate_building(&id, &req.name, &req.goal)
        .await
        .map_err(|e| state.reject(e.into()))?;

    state.prom_metrics.record_illumination("building");
    info!(building = %building.id, owner = %req.name, "building lit");
    Ok(Json(building))
}
