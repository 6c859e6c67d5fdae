//! Event pipeline for the notification relay.
//!
//! Raw events arrive from the website over pub/sub and are handed to a chain of
//! handlers that push them to realtime clients and, for some kinds, on to push
//! endpoints.
//!
//! # Architecture
//!
//! - **RelayEvent**: an event id, its untyped JSON payload and the time the relay received it
//! - **EventHandler**: trait implemented by everything that reacts to events
//! - **EventPublisher**: hands each event to the registered handlers in order
//! - **ChannelMessage**: the JSON body published on the pub/sub channel
//!
//! This crate has no dependencies on internal crates so that both the realtime
//! layer and the domain layer can implement handlers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;

pub mod channel;

pub use channel::ChannelMessage;

/// A single event flowing through the relay.
///
/// The payload shape depends on the event id and is not interpreted here.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEvent {
    pub id: String,
    pub payload: Value,
    pub time: DateTime<Utc>,
}

impl RelayEvent {
    /// Creates an event stamped with the current time.
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
            time: Utc::now(),
        }
    }
}

/// Trait for handling relay events.
/// Implementations perform side effects like broadcasting to connected
/// clients or dispatching push notifications. Handlers do not return errors:
/// each one is responsible for logging its own failures.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &RelayEvent);
}

/// Publishes relay events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Publish an event to all registered handlers, one after the other.
    pub async fn publish(&self, event: RelayEvent) {
        log::debug!(
            "Publishing event \"{}\" received at {} to {} handler(s)",
            event.id,
            event.time.to_rfc3339(),
            self.handlers.len()
        );

        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
