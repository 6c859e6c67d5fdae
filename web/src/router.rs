use crate::{
    controller::health_check_controller, middleware::origin::require_allowed_origin,
    socket::handler::socket_handler, AppState,
};
use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use log::*;
use service::config::Config;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn define_routes(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.service_state.config);

    Router::new()
        .merge(health_routes())
        .merge(socket_routes(app_state))
        .layer(cors)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn socket_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/socket", get(socket_handler))
        .route_layer(from_fn_with_state(app_state.clone(), require_allowed_origin))
        .with_state(app_state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allow_origin = if config.allowed_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring invalid allowed origin \"{origin}\": {e}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use domain::Authenticator;
    use realtime::Manager;
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_app(config: Config) -> Router {
        let db = Arc::new(DatabaseConnection::Disconnected);
        let service_state = service::AppState::new(config, &db);
        let authenticator = Authenticator::new(db, Duration::from_millis(3000));

        define_routes(AppState::new(
            service_state,
            Arc::new(Manager::new()),
            authenticator,
        ))
    }

    fn socket_request(origin: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/socket")
            .header(header::CONNECTION, "upgrade")
            .header(header::UPGRADE, "websocket")
            .header(header::SEC_WEBSOCKET_VERSION, "13")
            .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let app = test_app(Config::default());

        let response: Response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"healthy");
    }

    #[tokio::test]
    async fn socket_upgrades_from_unknown_origins_are_forbidden() {
        let app = test_app(Config::default());

        let response = app
            .oneshot(socket_request(Some("https://evil.example.com")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn socket_upgrades_from_allowed_origins_pass_the_origin_check() {
        let app = test_app(Config::default());

        let response = app
            .oneshot(socket_request(Some("http://localhost:3000")))
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn socket_upgrades_without_origin_pass_the_origin_check() {
        let app = test_app(Config::default());

        let response = app.oneshot(socket_request(None)).await.unwrap();

        assert_ne!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn empty_allow_list_accepts_any_origin() {
        let mut config = Config::default();
        config.allowed_origins.clear();
        let app = test_app(config);

        let response = app
            .oneshot(socket_request(Some("https://anywhere.example.com")))
            .await
            .unwrap();

        assert_ne!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn cors_headers_echo_allowed_origins() {
        let app = test_app(Config::default());

        let response = app
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "https://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://localhost:3000"
        );
    }
}
