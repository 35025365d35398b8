use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::server::CoverageServer;

/// Health check payload
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Liveness/readiness probe
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus)
    ),
    tag = "health"
)]
pub async fn health_check(State(server): State<CoverageServer>) -> Json<HealthStatus> {
    let database = if server.is_healthy().await {
        "reachable"
    } else {
        "unreachable"
    };

    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
