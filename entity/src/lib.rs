//! Read-only views of the website tables the relay consults.
//!
//! The website owns these tables and their migrations. The relay only maps the
//! columns it reads, so additional columns in the real schema are ignored.

pub mod push_notification_registration_endpoints;
pub mod sessions;

/// Primary key type of the push registration table.
pub type EndpointId = i64;
