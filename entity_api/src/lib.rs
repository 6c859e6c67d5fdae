//! Store queries used by the relay.
//!
//! Every function takes the connection explicitly and round-trips to the
//! database on each call. Nothing is cached here.

pub use entity::{push_notification_registration_endpoints, sessions, EndpointId};

pub mod error;
pub mod push_endpoint;
pub mod session;
