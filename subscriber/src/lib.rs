//! Redis pub/sub listener feeding the relay's event pipeline.
//!
//! The website publishes `{"eventId": ..., "payload": ...}` bodies on a single
//! channel. Each message is turned into a [`RelayEvent`] and published through
//! the [`EventPublisher`] before the next one is read, so handlers observe
//! events in channel order.

use events::{ChannelMessage, EventPublisher, RelayEvent};
use futures::StreamExt;
use log::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub mod error;

pub use error::{Error, SubscriberErrorKind};

/// How the listener gets its subscription back after losing the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before the first retry. Doubles with every further failure.
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failures tolerated before the listener gives up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    /// Wait after the `failures`-th consecutive failure (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Subscribes to `channel` and publishes every event received on it until
/// `shutdown` is cancelled.
///
/// A lost connection, a refused subscription or the server closing the stream
/// is retried per `policy`; a successful subscription resets the failure count.
/// Returns `Ok(())` on cancellation, or the last error once the policy gives up.
/// An unparseable `redis_url` fails immediately.
pub async fn listen(
    redis_url: &str,
    channel: &str,
    publisher: EventPublisher,
    policy: ReconnectPolicy,
    shutdown: CancellationToken,
) -> Result<(), Error> {
    let client = redis::Client::open(redis_url).map_err(Error::connection)?;
    let mut failures = 0u32;

    loop {
        let err = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Unsubscribing from redis channel \"{channel}\"");
                return Ok(());
            }
            Err(err) = consume(&client, channel, &publisher, &mut failures) => err,
        };

        failures += 1;
        if failures >= policy.max_attempts {
            error!("Giving up on redis channel \"{channel}\" after {failures} failed attempt(s)");
            return Err(err);
        }

        let delay = policy.delay(failures);
        warn!(
            "Redis subscription to \"{channel}\" lost ({err}), retrying in {}ms ({failures}/{})",
            delay.as_millis(),
            policy.max_attempts
        );

        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

// Runs one subscription until it fails. Never returns `Ok`.
async fn consume(
    client: &redis::Client,
    channel: &str,
    publisher: &EventPublisher,
    failures: &mut u32,
) -> Result<(), Error> {
    let mut pubsub = client.get_async_pubsub().await.map_err(Error::connection)?;
    pubsub.subscribe(channel).await.map_err(Error::connection)?;

    *failures = 0;
    info!("Subscribed to redis channel \"{channel}\"");

    let mut stream = pubsub.on_message();

    while let Some(message) = stream.next().await {
        let body = match message.get_payload::<String>() {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to read message payload on \"{channel}\": {e}");
                continue;
            }
        };

        if let Some(event) = handle_message(message.get_channel_name(), channel, &body) {
            publisher.publish(event).await;
        }
    }

    Err(Error::stream_ended(channel))
}

/// Turns a raw pub/sub message into an event.
///
/// Messages from other channels and bodies that are not a valid
/// `{"eventId", "payload"}` object yield `None`.
pub fn handle_message(channel_name: &str, expected_channel: &str, body: &str) -> Option<RelayEvent> {
    if channel_name != expected_channel {
        trace!("Ignoring message on channel \"{channel_name}\"");
        return None;
    }

    match ChannelMessage::parse(body) {
        Ok(message) => {
            debug!("Received event with id \"{}\"", message.event_id);
            Some(message.into_event())
        }
        Err(e) => {
            warn!("Skipping malformed message on \"{channel_name}\": {e}");
            None
        }
    }
}
