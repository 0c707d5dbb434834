//! Liveness plus a round-trip to the configured store

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::QueryService;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: &'static str,
    pub version: &'static str,
    /// duckdb, postgres or clickhouse
    pub backend: String,
    pub store: StoreHealth,
}

#[derive(Serialize, ToSchema)]
pub struct StoreHealth {
    pub reachable: bool,
}

/// Health route, mounted at `/api/v1/health`
pub fn routes(query: QueryService) -> Router<()> {
    Router::new()
        .route("/api/v1/health", get(health))
        .with_state(query)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and store are healthy", body = HealthResponse),
        (status = 503, description = "Store is unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(query): State<QueryService>) -> impl IntoResponse {
    let reachable = query.store_healthy().await;
    let (code, status) = if reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            backend: query.backend().to_string(),
            store: StoreHealth { reachable },
        }),
    )
}
