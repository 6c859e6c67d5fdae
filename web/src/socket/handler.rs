use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use domain::AuthOutcome;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::*;
use realtime::message::Frame;
use serde_json::Value;
use tokio::sync::mpsc;

/// Upgrades the request and runs the connection until either side closes it.
pub(crate) async fn socket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    debug!(
        "Realtime connection opened, awaiting authentication for up to {}ms",
        app_state.authenticator.window().as_millis()
    );

    let outcome = app_state
        .authenticator
        .authenticate(read_credentials(&mut ws_receiver))
        .await;

    let session_id = match outcome {
        AuthOutcome::Granted { session_id } => session_id,
        AuthOutcome::Denied => {
            if send_frame(&mut ws_sender, &Frame::unauthorized()).await.is_ok() {
                let _ = ws_sender.send(Message::Close(None)).await;
            }
            return;
        }
    };

    if let Err(e) = send_frame(&mut ws_sender, &Frame::authenticated()).await {
        debug!("Realtime connection closed before it was acknowledged: {e}");
        return;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection_id = app_state.manager.register_connection(session_id, tx);

    // Frames broadcast by the Manager are written by this task only.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Authenticated clients have nothing more to say; wait for them to leave.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = ws_receiver.next().await {
            if let Message::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    debug!("Realtime connection {connection_id} closed, cleaning up");
    app_state.manager.unregister_connection(&connection_id);
}

/// Reads the client's first message and returns its authentication data.
///
/// Anything other than an `authentication` frame, including the client
/// going away, yields `None`.
async fn read_credentials(receiver: &mut SplitStream<WebSocket>) -> Option<Value> {
    loop {
        match receiver.next().await? {
            Ok(Message::Text(text)) => {
                let frame = Frame::parse(text.as_str()).ok()?;
                return frame.is_authentication().then_some(frame.data);
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Ok(_) => return None,
            Err(e) => {
                debug!("Realtime connection failed before authentication: {e}");
                return None;
            }
        }
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &Frame,
) -> Result<(), axum::Error> {
    let json = frame.to_json().map_err(axum::Error::new)?;
    sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use crate::{router::define_routes, AppState};
    use async_trait::async_trait;
    use domain::error::Error;
    use domain::session::SessionStore;
    use domain::Authenticator;
    use futures::{SinkExt, StreamExt};
    use realtime::Manager;
    use sea_orm::DatabaseConnection;
    use serde_json::{json, Value};
    use service::config::Config;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    const WAIT: Duration = Duration::from_secs(5);

    struct KnownSessions(&'static [&'static str]);

    #[async_trait]
    impl SessionStore for KnownSessions {
        async fn count_sessions(&self, session_id: &str) -> Result<u64, Error> {
            Ok(self.0.iter().filter(|known| **known == session_id).count() as u64)
        }
    }

    /// Serves the relay routes on an ephemeral port with `sessions` as the only valid ids.
    async fn spawn_relay(sessions: &'static [&'static str], window: Duration) -> (SocketAddr, Arc<Manager>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let db = Arc::new(DatabaseConnection::Disconnected);
        let manager = Arc::new(Manager::new());
        let app_state = AppState::new(
            service::AppState::new(Config::default(), &db),
            Arc::clone(&manager),
            Authenticator::new(Arc::new(KnownSessions(sessions)), window),
        );

        tokio::spawn(async move {
            let _ = axum::serve(listener, define_routes(app_state)).await;
        });

        (addr, manager)
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}/socket")).await.unwrap();
        client
    }

    async fn authenticate(client: &mut Client, data: Value) {
        let frame = json!({"event": "authentication", "data": data});
        client.send(WsMessage::Text(frame.to_string())).await.unwrap();
    }

    async fn next_frame(client: &mut Client) -> Value {
        loop {
            match timeout(WAIT, client.next()).await.unwrap() {
                Some(Ok(WsMessage::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
                other => panic!("expected a text frame, got {other:?}"),
            }
        }
    }

    async fn assert_closed(client: &mut Client) {
        loop {
            match timeout(WAIT, client.next()).await.unwrap() {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Pong(_))) => continue,
                other => panic!("expected the socket to close, got {other:?}"),
            }
        }
    }

    async fn wait_for_connections(manager: &Manager, expected: usize) {
        timeout(WAIT, async {
            while manager.connection_count() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {expected} registered connection(s)"));
    }

    fn denial() -> Value {
        json!({"event": "unauthorized", "data": {"message": "Access denied."}})
    }

    #[tokio::test]
    async fn granted_clients_receive_broadcasts_until_they_leave() {
        let (addr, manager) = spawn_relay(&["abc"], Duration::from_secs(3)).await;
        let mut client = connect(addr).await;

        authenticate(&mut client, json!({"sessionId": "abc"})).await;

        assert_eq!(
            next_frame(&mut client).await,
            json!({"event": "authenticated", "data": true})
        );
        wait_for_connections(&manager, 1).await;

        manager.broadcast("mediaItem.live", &json!({"id": 42}));
        assert_eq!(
            next_frame(&mut client).await,
            json!({"event": "mediaItem.live", "data": {"id": 42}})
        );

        client.close(None).await.unwrap();
        wait_for_connections(&manager, 0).await;
    }

    #[tokio::test]
    async fn unknown_sessions_are_told_access_is_denied_and_closed() {
        let (addr, manager) = spawn_relay(&["abc"], Duration::from_secs(3)).await;
        let mut client = connect(addr).await;

        authenticate(&mut client, json!({"sessionId": "nope"})).await;

        assert_eq!(next_frame(&mut client).await, denial());
        assert_closed(&mut client).await;
        assert_eq!(manager.connection_count(), 0);
    }

    #[tokio::test]
    async fn a_first_frame_other_than_authentication_is_denied() {
        let (addr, manager) = spawn_relay(&["abc"], Duration::from_secs(3)).await;
        let mut client = connect(addr).await;

        let frame = json!({"event": "subscribe", "data": {"sessionId": "abc"}});
        client.send(WsMessage::Text(frame.to_string())).await.unwrap();

        assert_eq!(next_frame(&mut client).await, denial());
        assert_closed(&mut client).await;
        assert_eq!(manager.connection_count(), 0);
    }

    #[tokio::test]
    async fn pings_before_authentication_are_skipped() {
        let (addr, manager) = spawn_relay(&["abc"], Duration::from_secs(3)).await;
        let mut client = connect(addr).await;

        client.send(WsMessage::Ping(b"hello".to_vec())).await.unwrap();
        authenticate(&mut client, json!({"sessionId": "abc"})).await;

        assert_eq!(
            next_frame(&mut client).await,
            json!({"event": "authenticated", "data": true})
        );
        wait_for_connections(&manager, 1).await;
    }

    #[tokio::test]
    async fn silent_clients_are_denied_when_the_window_elapses() {
        let (addr, manager) = spawn_relay(&["abc"], Duration::from_millis(200)).await;
        let mut client = connect(addr).await;

        assert_eq!(next_frame(&mut client).await, denial());
        assert_closed(&mut client).await;
        assert_eq!(manager.connection_count(), 0);
    }
}
