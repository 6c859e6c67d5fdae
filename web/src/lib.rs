//! HTTP and WebSocket surface of the relay.

use domain::Authenticator;
use log::*;
use realtime::Manager;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{lookup_host, TcpListener};
use tokio_util::sync::CancellationToken;

mod controller;
mod middleware;
pub mod router;
mod socket;
mod tls;

/// How long open connections get to finish once an HTTPS server is told to stop.
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Everything the HTTP handlers need, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub manager: Arc<Manager>,
    pub authenticator: Authenticator,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        manager: Arc<Manager>,
        authenticator: Authenticator,
    ) -> Self {
        Self {
            service_state,
            manager,
            authenticator,
        }
    }
}

/// Binds the configured address and serves until `shutdown` is cancelled.
///
/// Serves HTTPS when the config names a TLS key and certificate, plain HTTP otherwise.
pub async fn init_server(app_state: AppState, shutdown: CancellationToken) -> io::Result<()> {
    let listen_addr = app_state.service_state.config.listen_address();
    let tls_paths = app_state.service_state.config.tls_paths()?;
    let router = router::define_routes(app_state);

    let Some(tls_paths) = tls_paths else {
        info!("Server starting... listening for connections on http://{listen_addr}");

        let listener = TcpListener::bind(&listen_addr).await?;
        return axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await;
    };

    let tls_config = tls::rustls_config(&tls_paths).await?;
    let socket_addr = lookup_host(&listen_addr).await?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{listen_addr} does not resolve to an address"),
        )
    })?;

    info!("Server starting... listening for connections on https://{listen_addr}");

    let handle = axum_server::Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
        }
    });

    axum_server::bind_rustls(socket_addr, tls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
}
