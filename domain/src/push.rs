//! Best-effort delivery of notifications to registered push endpoints.

use crate::error::Error;
use crate::notification::Notification;
use async_trait::async_trait;
use entity_api::push_notification_registration_endpoints;
use futures::future::join_all;
use log::*;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// A registered delivery target and the key material its messages are encrypted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEndpoint {
    pub url: String,
    pub key: String,
    pub auth_secret: String,
}

impl From<push_notification_registration_endpoints::Model> for PushEndpoint {
    fn from(model: push_notification_registration_endpoints::Model) -> Self {
        Self {
            url: model.url,
            key: model.key,
            auth_secret: model.auth_secret,
        }
    }
}

/// Source of the currently registered endpoints.
#[async_trait]
pub trait EndpointRegistry: Send + Sync {
    /// All endpoints in a stable order. Read fresh on every call.
    async fn list_endpoints(&self) -> Result<Vec<PushEndpoint>, Error>;
}

#[async_trait]
impl EndpointRegistry for DatabaseConnection {
    async fn list_endpoints(&self) -> Result<Vec<PushEndpoint>, Error> {
        let endpoints = entity_api::push_endpoint::find_all(self).await?;
        Ok(endpoints.into_iter().map(PushEndpoint::from).collect())
    }
}

/// Delivers one encrypted message to one endpoint.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, endpoint: &PushEndpoint, payload: &str, ttl: u32) -> Result<(), Error>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

pub struct PushDispatcher {
    registry: Arc<dyn EndpointRegistry>,
    sender: Arc<dyn PushSender>,
}

impl PushDispatcher {
    pub fn new(registry: Arc<dyn EndpointRegistry>, sender: Arc<dyn PushSender>) -> Self {
        Self { registry, sender }
    }

    /// Sends `notification` to every registered endpoint concurrently.
    ///
    /// Returns once every attempt has settled. A failing endpoint is logged and
    /// counted, it never stops or delays the others. Only a failure to list the
    /// endpoints is returned as an error, in which case nothing is sent.
    pub async fn dispatch(&self, notification: &Notification) -> Result<DispatchReport, Error> {
        let endpoints = self.registry.list_endpoints().await?;
        let payload = serde_json::to_string(&notification.payload)?;

        debug!(
            "Dispatching push notification to {} endpoint(s) with ttl {}s",
            endpoints.len(),
            notification.ttl
        );

        let outcomes = join_all(
            endpoints
                .iter()
                .map(|endpoint| self.deliver(endpoint, &payload, notification.ttl)),
        )
        .await;

        let delivered = outcomes.iter().filter(|delivered| **delivered).count();

        Ok(DispatchReport {
            attempted: outcomes.len(),
            delivered,
            failed: outcomes.len() - delivered,
        })
    }

    async fn deliver(&self, endpoint: &PushEndpoint, payload: &str, ttl: u32) -> bool {
        info!("Making request to push endpoint \"{}\".", endpoint.url);

        match self.sender.send(endpoint, payload, ttl).await {
            Ok(()) => {
                info!("Made request to push endpoint \"{}\".", endpoint.url);
                true
            }
            Err(e) => {
                warn!("Request to push endpoint \"{}\" failed: {e}", endpoint.url);
                false
            }
        }
    }
}
