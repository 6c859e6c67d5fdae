//! Classification of relay events into user-facing notifications.

use serde::Serialize;
use serde_json::Value;

/// How long receivers keep a notification on screen, whatever its kind.
pub const DISPLAY_DURATION_MS: u64 = 8000;
/// Push time-to-live used when a `custom` event does not carry one.
pub const DEFAULT_TTL_SECS: u32 = 300;
pub const LIVE_TTL_SECS: u32 = 300;
pub const VOD_AVAILABLE_TTL_SECS: u32 = 86_400;

pub const MEDIA_ITEM_LIVE: &str = "mediaItem.live";
pub const MEDIA_ITEM_VOD_AVAILABLE: &str = "mediaItem.vodAvailable";
pub const CUSTOM: &str = "custom";

/// What clients and push endpoints receive, serialized as
/// `{"title", "body", "url", "iconUrl", "duration", "tag"}` with `null` for
/// absent values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
    pub duration: u64,
    /// Receivers replace an earlier notification carrying the same tag.
    pub tag: Option<String>,
}

/// A classified event: the payload plus the time-to-live for push delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub payload: NotificationPayload,
    pub ttl: u32,
}

/// Maps a relay event onto a notification.
///
/// Only `mediaItem.live`, `mediaItem.vodAvailable` and `custom` are
/// notification-worthy; any other id yields `None`.
pub fn classify(event_id: &str, payload: &Value) -> Option<Notification> {
    match event_id {
        MEDIA_ITEM_LIVE => Some(build(
            payload,
            "We are live!".to_string(),
            format!("We are now live with \"{}\".", text(&payload["name"])),
            LIVE_TTL_SECS,
            Some(format!("{MEDIA_ITEM_LIVE}.{}", text(&payload["id"]))),
        )),
        MEDIA_ITEM_VOD_AVAILABLE => Some(build(
            payload,
            "New content available!".to_string(),
            format!(
                "\"{}\" is now available to watch on demand.",
                text(&payload["name"])
            ),
            VOD_AVAILABLE_TTL_SECS,
            Some(format!("{MEDIA_ITEM_VOD_AVAILABLE}.{}", text(&payload["id"]))),
        )),
        CUSTOM => Some(build(
            payload,
            text(&payload["title"]),
            text(&payload["body"]),
            custom_ttl(&payload["ttl"]),
            optional_text(&payload["tag"]),
        )),
        _ => None,
    }
}

fn build(
    payload: &Value,
    title: String,
    body: String,
    ttl: u32,
    tag: Option<String>,
) -> Notification {
    Notification {
        payload: NotificationPayload {
            title,
            body,
            url: optional_text(&payload["url"]),
            icon_url: optional_text(&payload["iconUrl"]),
            duration: DISPLAY_DURATION_MS,
            tag,
        },
        ttl,
    }
}

/// A supplied ttl is honoured when it is a non-negative number of seconds that
/// fits the push header, zero included. Fractions are truncated to whole seconds.
fn custom_ttl(value: &Value) -> u32 {
    value
        .as_f64()
        .filter(|ttl| ttl.is_finite() && (0.0..=f64::from(u32::MAX)).contains(ttl))
        .map(|ttl| ttl.trunc() as u32)
        .unwrap_or(DEFAULT_TTL_SECS)
}

// Strings verbatim, other JSON values as their JSON text, missing as "".
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Non-empty strings and numbers; anything else counts as absent.
fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
