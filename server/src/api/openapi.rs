//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{health, query};
use crate::domain::query::{
    Aggregation, Capabilities, DimensionRef, GroupByRef, MetricRef, OrderByRef, QueryRequest,
    TimeDimensionRef, ValueType,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tracelens API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Analytical queries over LLM traces"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "query", description = "Analytical queries and the view catalogue")
    ),
    paths(
        // Health
        health::health,
        // Query
        query::run_query,
        query::list_views,
    ),
    components(schemas(
        // Health
        health::HealthResponse,
        health::StoreHealth,
        // Query request
        QueryRequest,
        DimensionRef,
        MetricRef,
        TimeDimensionRef,
        GroupByRef,
        OrderByRef,
        // Query responses
        query::QueryResponse,
        query::ViewsResponse,
        query::ViewDto,
        query::FieldDto,
        ValueType,
        Capabilities,
        Aggregation,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}
