//! # Window Lights API
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /api/lights` | All lights, oldest first |
//! | `POST /api/lights` | Claim (or re-claim) a window |
//! | `GET /api/lights/{window_id}` | Single light |

use super::error::ApiError;
use super::AppState;
use crate::model::{Light, WindowId};
use crate::validate;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub(super) async fn handler_lights_list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Light>>, ApiError> {
    Ok(Json(state.storage.list_lights().await?))
}

/// `POST /api/lights` — validate, timestamp, and upsert a light.
///
/// Re-claiming a window overwrites its previous owner. A new window is
/// refused once every window is lit.
pub(super) async fn handler_lights_create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Light>), ApiError> {
    let Json(body) = payload.map_err(|e| state.reject(e.into()))?;
    let draft = validate::validate_light(
        &body,
        state.storage.total_windows(),
        &state.config.default_color,
    )
    .map_err(|e| state.reject(e.into()))?;
    let light = state
        .storage
        .put_light(draft)
        .await
        .map_err(|e| state.reject(e.into()))?;

    state.prom_metrics.record_illumination("window");
    info!(
        window_id = %light.window_id,
        name = %light.name,
        color = %light.color,
        "window lit"
    );
    Ok((StatusCode::CREATED, Json(light)))
}

pub(super) async fn handler_light_get(
    State(state): State<Arc<AppState>>,
    Path(window_id): Path<String>,
) -> Result<Json<Light>, ApiError> {
    let id = WindowId::from_path(&window_id);
    match state.storage.get_light(&id).await? {
        Some(light) => Ok(Json(light)),
        None => Err(state.reject(ApiError::NotFound(format!(
            "No light for window {}",
            id
        )))),
    }
}
