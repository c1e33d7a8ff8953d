use axum::response::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Liveness of the legal assistant process
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: String,
    /// Crate version of the running build
    pub version: String,
}

/// Liveness probe
///
/// Neither the assistant service nor the search provider is contacted, so
/// a healthy answer says nothing about upstream availability.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is up", body = HealthResponse),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
