use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::*;
use tokio::sync::mpsc::UnboundedSender;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authenticated connection. The sender feeds the socket's write loop with
/// serialized frames.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub session_id: String,
    pub connected_at: DateTime<Utc>,
    pub sender: UnboundedSender<String>,
}

/// The set of live, authenticated connections. Only ever appended to and
/// removed from, so emission needs no lock beyond DashMap's shard locks.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    pub fn register(&self, session_id: String, sender: UnboundedSender<String>) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                session_id,
                connected_at: Utc::now(),
                sender,
            },
        );

        connection_id
    }

    /// Removes a connection, returning its info if it was still registered.
    pub fn unregister(&self, connection_id: &ConnectionId) -> Option<ConnectionInfo> {
        self.connections
            .remove(connection_id)
            .map(|(_, info)| info)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queues `frame` on every connection - O(n). Returns how many connections
    /// accepted it. A connection whose socket task has already gone is skipped;
    /// its own task unregisters it.
    pub fn broadcast(&self, frame: &str) -> usize {
        let mut delivered = 0;

        for entry in self.connections.iter() {
            match entry.value().sender.send(frame.to_owned()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!(
                    "Failed to send broadcast to connection {}: {}",
                    entry.key().as_str(),
                    e
                ),
            }
        }

        delivered
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
