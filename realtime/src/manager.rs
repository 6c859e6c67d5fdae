use crate::connection::{ConnectionId, ConnectionRegistry};
use crate::message::Frame;
use log::*;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Event broadcaster: owns the live connection set and fans events out to it.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register an authenticated connection and return its unique ID
    pub fn register_connection(
        &self,
        session_id: String,
        sender: UnboundedSender<String>,
    ) -> ConnectionId {
        let connection_id = self.registry.register(session_id, sender);
        info!(
            "Registered realtime connection {connection_id} ({} live)",
            self.registry.len()
        );
        connection_id
    }

    /// Unregister a connection by ID
    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        if let Some(info) = self.registry.unregister(connection_id) {
            info!(
                "Unregistered realtime connection {connection_id} after {}s ({} live)",
                (chrono::Utc::now() - info.connected_at).num_seconds(),
                self.registry.len()
            );
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Emit an event to every authenticated connection.
    ///
    /// Fire-and-forget: nothing is acknowledged, retried or kept for clients
    /// that connect later.
    pub fn broadcast(&self, event_id: &str, payload: &Value) {
        let frame = match Frame::new(event_id, payload.clone()).to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize event \"{event_id}\": {e}");
                return;
            }
        };

        debug!("Emitting event with id \"{event_id}\" on socket");
        let delivered = self.registry.broadcast(&frame);
        debug!("Emitted event with id \"{event_id}\" to {delivered} connection(s)");
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
