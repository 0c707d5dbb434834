//! Analytical query endpoints

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::extractors::{ProjectPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::QueryRow;
use crate::domain::query::{
    Aggregation, Capabilities, FieldDescriptor, QueryRequest, QueryService, ValueType,
    ViewDescriptor,
};

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct QueryApiState {
    pub query: QueryService,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    /// One object per result row, keyed by output column
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<QueryRow>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDto {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub capabilities: Capabilities,
    /// Empty unless the field is a metric
    pub aggregations: Vec<Aggregation>,
}

impl From<&FieldDescriptor> for FieldDto {
    fn from(field: &FieldDescriptor) -> Self {
        Self {
            name: field.name,
            value_type: field.value_type,
            capabilities: field.capabilities,
            aggregations: field.allowed_aggregations().to_vec(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewDto {
    pub name: &'static str,
    pub description: &'static str,
    pub time_field: &'static str,
    pub fields: Vec<FieldDto>,
}

impl From<&ViewDescriptor> for ViewDto {
    fn from(view: &ViewDescriptor) -> Self {
        Self {
            name: view.name,
            description: view.description,
            time_field: view.time_field,
            fields: view.fields.iter().map(FieldDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewsResponse {
    pub data: Vec<ViewDto>,
}

// ============================================================================
// Routes
// ============================================================================

/// Project-scoped query routes, nested under `/api/v1/project`
pub fn project_routes(query: QueryService) -> Router<()> {
    Router::new()
        .route("/{project_id}/query", post(run_query))
        .with_state(QueryApiState { query })
}

/// Catalogue routes, nested under `/api/v1/query`
pub fn catalogue_routes(query: QueryService) -> Router<()> {
    Router::new()
        .route("/views", get(list_views))
        .with_state(QueryApiState { query })
}

// ============================================================================
// Handlers
// ============================================================================

/// Run an analytical query scoped to a project
#[utoipa::path(
    post,
    path = "/api/v1/project/{project_id}/query",
    tag = "query",
    params(("project_id" = String, Path, description = "Project ID")),
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query result rows", body = QueryResponse),
        (status = 400, description = "Rejected query"),
        (status = 500, description = "Query execution failed")
    )
)]
pub async fn run_query(
    State(state): State<QueryApiState>,
    path: ProjectPath,
    ValidatedJson(req): ValidatedJson<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let data = state.query.execute(&path.project_id, &req).await?;
    Ok(Json(QueryResponse { data }))
}

/// List queryable views with their fields
#[utoipa::path(
    get,
    path = "/api/v1/query/views",
    tag = "query",
    responses(
        (status = 200, description = "Registered views", body = ViewsResponse)
    )
)]
pub async fn list_views(State(state): State<QueryApiState>) -> Json<ViewsResponse> {
    let data = state.query.registry().views().map(ViewDto::from).collect();
    Json(ViewsResponse { data })
}
