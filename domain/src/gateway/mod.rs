//! Clients for services outside the relay.

pub mod web_push;
