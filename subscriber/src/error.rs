//! Error types for the subscription listener.
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<redis::RedisError>,
    pub error_kind: SubscriberErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum SubscriberErrorKind {
    /// Connecting to the server or subscribing to the channel failed.
    Connection,
    /// The server closed the subscription.
    StreamEnded(String),
}

impl Error {
    pub(crate) fn connection(err: redis::RedisError) -> Self {
        Error {
            source: Some(err),
            error_kind: SubscriberErrorKind::Connection,
        }
    }

    pub(crate) fn stream_ended(channel: &str) -> Self {
        Error {
            source: None,
            error_kind: SubscriberErrorKind::StreamEnded(channel.to_string()),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Subscriber Error ({:?}): {source}", self.error_kind),
            None => write!(f, "Subscriber Error ({:?})", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_ended_names_the_channel() {
        let err = Error::stream_ended("siteNotificationsChannel");

        assert!(err.to_string().contains("siteNotificationsChannel"));
        assert!(err.source().is_none());
    }
}
