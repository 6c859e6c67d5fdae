use crate::notification::classify;
use crate::push::PushDispatcher;
use async_trait::async_trait;
use events::{EventHandler, RelayEvent};
use log::*;
use realtime::message::NOTIFICATION_EVENT;
use realtime::Manager;
use std::sync::Arc;

/// Turns notification-worthy relay events into `notification` broadcasts and,
/// when push is enabled, into push dispatches.
pub struct NotificationEventHandler {
    manager: Arc<Manager>,
    dispatcher: Option<Arc<PushDispatcher>>,
}

impl NotificationEventHandler {
    /// `dispatcher` is `None` when push notifications are disabled.
    pub fn new(manager: Arc<Manager>, dispatcher: Option<Arc<PushDispatcher>>) -> Self {
        Self {
            manager,
            dispatcher,
        }
    }
}

#[async_trait]
impl EventHandler for NotificationEventHandler {
    async fn handle(&self, event: &RelayEvent) {
        let Some(notification) = classify(&event.id, &event.payload) else {
            return;
        };

        match serde_json::to_value(&notification.payload) {
            Ok(payload) => self.manager.broadcast(NOTIFICATION_EVENT, &payload),
            Err(e) => error!("Failed to serialize notification for \"{}\": {e}", event.id),
        }

        let Some(dispatcher) = &self.dispatcher else {
            return;
        };

        let dispatcher = Arc::clone(dispatcher);
        let event_id = event.id.clone();
        tokio::spawn(async move {
            match dispatcher.dispatch(&notification).await {
                Ok(report) => info!(
                    "Push dispatch for \"{event_id}\" finished: {} attempted, {} delivered, {} failed",
                    report.attempted, report.delivered, report.failed
                ),
                Err(e) => error!("Push dispatch for \"{event_id}\" aborted: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::push::tests::{endpoint, FakeRegistry};
    use crate::push::{PushEndpoint, PushSender};
    use realtime::message::Frame;
    use serde_json::json;
    use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

    /// Forwards each delivery attempt to the test as `(url, payload, ttl)`.
    struct ChannelSender(UnboundedSender<(String, String, u32)>);

    #[async_trait]
    impl PushSender for ChannelSender {
        async fn send(&self, endpoint: &PushEndpoint, payload: &str, ttl: u32) -> Result<(), Error> {
            let _ = self
                .0
                .send((endpoint.url.clone(), payload.to_string(), ttl));
            Ok(())
        }
    }

    fn connected_manager() -> (Arc<Manager>, UnboundedReceiver<String>) {
        let manager = Arc::new(Manager::new());
        let (tx, rx) = mpsc::unbounded_channel();
        manager.register_connection("session".to_string(), tx);
        (manager, rx)
    }

    fn push_enabled(
        endpoints: Vec<PushEndpoint>,
    ) -> (Arc<PushDispatcher>, UnboundedReceiver<(String, String, u32)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = PushDispatcher::new(
            Arc::new(FakeRegistry {
                endpoints,
                fail: false,
            }),
            Arc::new(ChannelSender(tx)),
        );
        (Arc::new(dispatcher), rx)
    }

    #[tokio::test]
    async fn live_events_are_broadcast_and_pushed() {
        let (manager, mut frames) = connected_manager();
        let (dispatcher, mut pushes) = push_enabled(vec![endpoint(1), endpoint(2)]);
        let handler = NotificationEventHandler::new(manager, Some(dispatcher));

        handler
            .handle(&RelayEvent::new(
                "mediaItem.live",
                json!({"id": "42", "name": "Show", "url": "u", "iconUrl": "i"}),
            ))
            .await;

        let expected = json!({
            "title": "We are live!",
            "body": "We are now live with \"Show\".",
            "url": "u",
            "iconUrl": "i",
            "duration": 8000,
            "tag": "mediaItem.live.42"
        });
        let frame = Frame::parse(&frames.recv().await.unwrap()).unwrap();
        assert_eq!(frame, Frame::new("notification", expected.clone()));

        let mut urls = Vec::new();
        for _ in 0..2 {
            let (url, payload, ttl) = pushes.recv().await.unwrap();
            assert_eq!(serde_json::from_str::<serde_json::Value>(&payload).unwrap(), expected);
            assert_eq!(ttl, 300);
            urls.push(url);
        }
        urls.sort();
        assert_eq!(urls, vec![endpoint(1).url, endpoint(2).url]);
    }

    #[tokio::test]
    async fn unrecognized_events_are_neither_broadcast_nor_pushed() {
        let (manager, mut frames) = connected_manager();
        let (dispatcher, mut pushes) = push_enabled(vec![endpoint(1)]);
        let handler = NotificationEventHandler::new(manager, Some(dispatcher));

        handler
            .handle(&RelayEvent::new("mediaItem.deleted", json!({"id": 1})))
            .await;
        tokio::task::yield_now().await;

        assert!(frames.try_recv().is_err());
        assert!(pushes.try_recv().is_err());
    }

    #[tokio::test]
    async fn disabled_push_only_broadcasts() {
        let (manager, mut frames) = connected_manager();
        let handler = NotificationEventHandler::new(manager, None);

        handler
            .handle(&RelayEvent::new(
                "custom",
                json!({"title": "Heads up", "body": "Soon", "ttl": 60}),
            ))
            .await;

        let frame = Frame::parse(&frames.recv().await.unwrap()).unwrap();
        assert_eq!(frame.event, "notification");
        assert_eq!(frame.data["title"], "Heads up");
        assert_eq!(frame.data["tag"], serde_json::Value::Null);
    }
}
