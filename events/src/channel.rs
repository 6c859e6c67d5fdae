use crate::RelayEvent;
use serde::Deserialize;
use serde_json::Value;

/// Body of a message published on the relay's pub/sub channel.
///
/// ```json
/// {"eventId": "mediaItem.live", "payload": {"id": 42, "name": "Show"}}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    pub event_id: String,
    #[serde(default)]
    pub payload: Value,
}

impl ChannelMessage {
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Converts the message into an event stamped with the time of receipt.
    pub fn into_event(self) -> RelayEvent {
        RelayEvent::new(self.event_id, self.payload)
    }
}
