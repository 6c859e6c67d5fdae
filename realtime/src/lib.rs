//! Realtime fan-out infrastructure.
//!
//! Pushes relay events from the backend to every authenticated realtime client.
//!
//! # Architecture
//!
//! - **Authenticated connections only**: a socket is registered with the
//!   `Manager` once its session id has been accepted. Until then it receives nothing.
//! - **Broadcast only**: every event goes to every registered connection.
//! - **Ephemeral messages**: events are not stored. A client that is offline
//!   misses them and a client that connects later is not backfilled.
//! - **One writer per socket**: each connection owns an unbounded channel of
//!   serialized frames drained by its socket task, so a broadcast never waits on I/O.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry and the type-safe ConnectionId
//! - `manager`: the broadcaster used by the rest of the relay
//! - `message`: frame format and the well-known event names
//! - `clock`: the synchronised clock ticker
//! - `event_handler`: forwards every relay event to the broadcaster

pub mod clock;
pub mod connection;
pub mod event_handler;
pub mod manager;
pub mod message;

pub use event_handler::RealtimeEventHandler;
pub use manager::Manager;
