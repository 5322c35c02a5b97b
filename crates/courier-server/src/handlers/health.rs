//! Health check endpoint

use axum::Json;

use crate::models::HealthResponse;

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Broker is serving", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
