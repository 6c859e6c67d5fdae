use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use log::*;

/// Refuses requests whose `Origin` header is not in the configured allow list.
///
/// Requests without an `Origin` header (non-browser clients) pass through.
pub async fn require_allowed_origin(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let refused_origin = request.headers().get(header::ORIGIN).and_then(|origin| {
        match origin.to_str() {
            Ok(value) if app_state.service_state.config.is_origin_allowed(value) => None,
            _ => Some(origin.clone()),
        }
    });

    match refused_origin {
        None => next.run(request).await,
        Some(origin) => {
            warn!("Refusing realtime connection from origin {origin:?}");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}
