//! Relay behaviour on top of the store and the realtime layer: connection
//! authentication, notification classification and push dispatch.
//!
//! Consumers of the `domain` crate never need to depend on `entity_api`
//! directly. Store access goes through the [`session::SessionStore`] and
//! [`push::EndpointRegistry`] traits, which `DatabaseConnection` implements.

pub use entity_api::{push_notification_registration_endpoints, sessions, EndpointId};

pub mod connection_auth;
pub mod error;
pub mod gateway;
pub mod notification;
pub mod notification_event_handler;
pub mod push;
pub mod session;

pub use connection_auth::{AuthOutcome, Authenticator};
pub use notification::{classify, Notification, NotificationPayload};
pub use notification_event_handler::NotificationEventHandler;
pub use push::{DispatchReport, PushDispatcher, PushEndpoint};
