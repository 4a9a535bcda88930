use crate::server::models::HealthResponse;
use axum::Json;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
