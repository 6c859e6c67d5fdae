use crate::error::Error;
use crate::push::{PushEndpoint, PushSender};
use async_trait::async_trait;
use log::*;
use service::config::Config;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient,
    WebPushMessage, WebPushMessageBuilder,
};

/// Web Push protocol client. Payloads are encrypted with each endpoint's
/// keys and, when a VAPID key is configured, signed with it.
pub struct WebPushSender {
    client: IsahcWebPushClient,
    vapid_private_key: Option<Vec<u8>>,
}

impl WebPushSender {
    pub fn new(vapid_private_key: Option<Vec<u8>>) -> Result<Self, Error> {
        let client = IsahcWebPushClient::new().map_err(Error::config)?;
        Ok(Self {
            client,
            vapid_private_key,
        })
    }

    /// Builds a sender, reading the VAPID PEM key named by the config if any.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let vapid_private_key = match config.push_vapid_private_key_path() {
            Some(path) => {
                debug!("Loading VAPID private key from {}", path.display());
                Some(std::fs::read(path).map_err(Error::config)?)
            }
            None => {
                warn!("No VAPID private key configured, push messages will be unsigned");
                None
            }
        };

        Self::new(vapid_private_key)
    }

    fn build_message(
        &self,
        endpoint: &PushEndpoint,
        payload: &str,
        ttl: u32,
    ) -> Result<WebPushMessage, Error> {
        let subscription = SubscriptionInfo::new(
            endpoint.url.as_str(),
            endpoint.key.as_str(),
            endpoint.auth_secret.as_str(),
        );

        let mut builder = WebPushMessageBuilder::new(&subscription);
        builder.set_ttl(ttl);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());

        if let Some(pem) = &self.vapid_private_key {
            let signature = VapidSignatureBuilder::from_pem(pem.as_slice(), &subscription)
                .map_err(Error::push_delivery)?
                .build()
                .map_err(Error::push_delivery)?;
            builder.set_vapid_signature(signature);
        }

        builder.build().map_err(Error::push_delivery)
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(&self, endpoint: &PushEndpoint, payload: &str, ttl: u32) -> Result<(), Error> {
        let message = self.build_message(endpoint, payload, ttl)?;
        self.client.send(message).await.map_err(Error::push_delivery)
    }
}
