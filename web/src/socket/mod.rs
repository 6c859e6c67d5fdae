//! WebSocket endpoint for realtime clients.
//!
//! The core realtime infrastructure (Manager, ConnectionRegistry, frames)
//! lives in the `realtime` crate. This module only owns the socket lifecycle.

pub(crate) mod handler;
