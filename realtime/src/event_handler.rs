use crate::Manager;
use async_trait::async_trait;
use events::{EventHandler, RelayEvent};
use std::sync::Arc;

/// Broadcasts every relay event, unchanged, to all authenticated connections.
pub struct RealtimeEventHandler {
    manager: Arc<Manager>,
}

impl RealtimeEventHandler {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl EventHandler for RealtimeEventHandler {
    async fn handle(&self, event: &RelayEvent) {
        self.manager.broadcast(&event.id, &event.payload);
    }
}
