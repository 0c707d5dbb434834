//! HTTP middleware (404 handler)

use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Handle 404 Not Found with logging
pub async fn handle_404(req: Request) -> impl IntoResponse {
    tracing::debug!(method = %req.method(), uri = %req.uri(), "[404]");
    StatusCode::NOT_FOUND
}
