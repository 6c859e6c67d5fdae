use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event name carrying a notification payload.
pub const NOTIFICATION_EVENT: &str = "notification";
/// Event name carrying the relay's current time in Unix milliseconds.
pub const CLOCK_EVENT: &str = "synchronisedClock.time";
/// Event a client sends to present its session id.
pub const AUTHENTICATION_EVENT: &str = "authentication";
/// Reply to a client whose session id was accepted.
pub const AUTHENTICATED_EVENT: &str = "authenticated";
/// Reply to a client whose authentication was denied, sent just before closing.
pub const UNAUTHORIZED_EVENT: &str = "unauthorized";

/// The only reason ever given to a denied client.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied.";

/// A named event with a JSON payload, the unit sent over a realtime connection
/// in both directions.
///
/// ```json
/// {"event": "notification", "data": {"title": "We are live!"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn authenticated() -> Self {
        Self::new(AUTHENTICATED_EVENT, Value::Bool(true))
    }

    pub fn unauthorized() -> Self {
        Self::new(
            UNAUTHORIZED_EVENT,
            json!({ "message": ACCESS_DENIED_MESSAGE }),
        )
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_authentication(&self) -> bool {
        self.event == AUTHENTICATION_EVENT
    }
}
