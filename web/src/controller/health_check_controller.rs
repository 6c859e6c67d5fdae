use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET liveness check for load balancers and orchestrators
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}
