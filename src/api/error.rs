//! Request-boundary error type. Every handler failure ends up here and is
//! rendered as a JSON `{message}` body with a consistent status code.

use crate::store::StoreError;
use crate::validate::ValidationError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Exhausted(&'static str),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Body exceeded the request size limit while being buffered.
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Exhausted(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for the rejection counter. Internal failures are not rejections.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ApiError::Validation(_) => Some("validation"),
            ApiError::Exhausted(_) => Some("exhausted"),
            ApiError::NotFound(_) => Some("not_found"),
            ApiError::Conflict(_) => Some("conflict"),
            ApiError::PayloadTooLarge(_) => Some("payload_too_large"),
            ApiError::Internal(_) => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Exhausted(msg) => ApiError::Exhausted(msg),
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Conflict(_) => ApiError::Conflict(err.to_string()),
            StoreError::Database(e) => ApiError::Internal(e.into()),
        }
    }
}

/// Unparseable bodies are validation failures; a body cut off by the size
/// limit keeps its 413.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(rejection.body_text());
        }
        ApiError::Validation(ValidationError::malformed_body(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(v) => serde_json::json!({
                "message": v.to_string(),
                "errors": v.issues,
            }),
            ApiError::Internal(e) => {
                error!(error = %e, "request failed");
                serde_json::json!({"message": "Internal server error"})
            }
            other => serde_json::json!({"message": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_distinct_statuses() {
        let cases = [
            (StoreError::Exhausted("full"), StatusCode::BAD_REQUEST),
            (StoreError::NotFound("b9".into()), StatusCode::NOT_FOUND),
            (StoreError::Conflict("b9".into()), StatusCode::CONFLICT),
            (
                StoreError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn conflict_message_names_the_building() {
        let err = ApiError::from(StoreError::Conflict("b6".into()));
        assert_eq!(err.to_string(), "Building b6 is already illuminated");
        assert_eq!(err.reason(), Some("conflict"));
    }

    #[test]
    fn oversize_body_is_not_a_validation_error() {
        let err = ApiError::PayloadTooLarge("length limit exceeded".into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.reason(), Some("payload_too_large"));
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = ApiError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
