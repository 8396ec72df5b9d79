//! Route handlers.

use super::ApiState;
use crate::{
    error::{ErrorBody, EstimateError, INTERNAL_ERROR_MESSAGE},
    types::FeeEstimate,
};
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use tracing::error;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok".to_string() })
}

/// `POST /api/estimate`
pub async fn estimate(
    State(state): State<ApiState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<FeeEstimate>, EstimateError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            EstimateError::BodyTooLarge { limit: state.max_body_bytes }
        } else {
            EstimateError::InvalidBody(rejection.body_text())
        }
    })?;

    let payload: Value =
        serde_json::from_slice(&body).map_err(|err| EstimateError::InvalidBody(err.to_string()))?;

    Ok(Json(state.estimator.estimate(&payload).await?))
}

/// Any other route or method.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, ErrorBody::new("Not found")).into_response()
}

/// Turns a panic in a handler into a `500`.
pub fn internal_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(%detail, "Handler panicked");

    (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INTERNAL_ERROR_MESSAGE)).into_response()
}
