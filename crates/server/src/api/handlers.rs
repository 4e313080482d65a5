use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use mulearr_core::{HashIdentityMapping, SanitizedConfig};

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct MappingsResponse {
    pub mappings: Vec<HashIdentityMapping>,
    pub count: usize,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /mappings
///
/// Every stored native/borrowed hash pair, newest first.
pub async fn list_mappings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MappingsResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.hash_store().all() {
        Ok(mappings) => Ok(Json(MappingsResponse {
            count: mappings.len(),
            mappings,
        })),
        Err(e) => {
            error!(error = %e, "Failed to read hash mappings");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
