use domain::gateway::web_push::WebPushSender;
use domain::{Authenticator, NotificationEventHandler, PushDispatcher};
use events::EventPublisher;
use log::*;
use realtime::{clock, Manager, RealtimeEventHandler};
use service::{config::Config, logging::Logger};
use std::process;
use std::sync::Arc;
use subscriber::ReconnectPolicy;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();

    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
        process::exit(1);
    }

    info!(
        "Starting notification relay in {} mode",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to connect to the database: {e}");
            process::exit(1);
        }
    };

    let service_state = service::AppState::new(config.clone(), &db);
    let manager = Arc::new(Manager::new());
    let authenticator = Authenticator::new(service_state.db_conn(), config.auth_timeout());

    let dispatcher = if config.push_notifications_enabled {
        match WebPushSender::from_config(&config) {
            Ok(sender) => Some(Arc::new(PushDispatcher::new(
                service_state.db_conn(),
                Arc::new(sender),
            ))),
            Err(e) => {
                error!("Failed to set up push notifications: {e}");
                process::exit(1);
            }
        }
    } else {
        info!("Push notifications are disabled");
        None
    };

    let publisher = EventPublisher::new()
        .with_handler(Arc::new(RealtimeEventHandler::new(Arc::clone(&manager))))
        .with_handler(Arc::new(NotificationEventHandler::new(
            Arc::clone(&manager),
            dispatcher,
        )));

    let shutdown = CancellationToken::new();

    let clock_task = clock::spawn(
        Arc::clone(&manager),
        config.clock_interval(),
        shutdown.clone(),
    );

    let subscriber_task = tokio::spawn({
        let redis_url = config.redis_url().to_string();
        let channel = config.redis_channel().to_string();
        let shutdown = shutdown.clone();
        async move {
            let result = subscriber::listen(
                &redis_url,
                &channel,
                publisher,
                ReconnectPolicy::default(),
                shutdown.clone(),
            )
            .await;
            if let Err(e) = &result {
                error!("Subscription listener stopped: {e}");
                shutdown.cancel();
            }
            result
        }
    });

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => error!("Failed to listen for the shutdown signal: {e}"),
            }
            shutdown.cancel();
        }
    });

    let app_state = web::AppState::new(service_state, manager, authenticator);
    let server_result = web::init_server(app_state, shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = clock_task.await {
        warn!("Clock ticker did not stop cleanly: {e}");
    }

    let subscriber_failed = !matches!(subscriber_task.await, Ok(Ok(())));

    if let Err(e) = server_result {
        error!("Server failed: {e}");
        process::exit(1);
    }

    if subscriber_failed {
        process::exit(1);
    }

    info!("Notification relay stopped");
}
