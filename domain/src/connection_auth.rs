//! Authentication gate for new realtime connections.
//!
//! A connection is `Pending` from the moment it opens until [`Authenticator::authenticate`]
//! returns, which always yields `Granted` or `Denied` within the configured window.
//! Every ambiguous outcome (missing or malformed session id, store failure, window
//! elapsed, client gone) is a denial.

use crate::session::{self, SessionStore};
use log::*;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Field of the authentication data carrying the session id.
pub const SESSION_ID_FIELD: &str = "sessionId";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted { session_id: String },
    Denied,
}

#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn SessionStore>,
    window: Duration,
}

impl Authenticator {
    pub fn new(store: Arc<dyn SessionStore>, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decides whether a connection may stay open.
    ///
    /// `credentials` resolves to the authentication data the client sent, or
    /// `None` if the client left or sent something else. Waiting for it and
    /// validating the session both count against the window.
    pub async fn authenticate<F>(&self, credentials: F) -> AuthOutcome
    where
        F: Future<Output = Option<Value>>,
    {
        match tokio::time::timeout(self.window, self.decide(credentials)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                info!(
                    "User denied access: no authentication within {}ms.",
                    self.window.as_millis()
                );
                AuthOutcome::Denied
            }
        }
    }

    async fn decide<F>(&self, credentials: F) -> AuthOutcome
    where
        F: Future<Output = Option<Value>>,
    {
        let Some(data) = credentials.await else {
            info!("User denied access: no authentication data received.");
            return AuthOutcome::Denied;
        };

        let session_id = data.get(SESSION_ID_FIELD).cloned().unwrap_or(Value::Null);

        match session::is_valid(self.store.as_ref(), &session_id).await {
            Ok(true) => {
                info!("User granted access.");
                AuthOutcome::Granted {
                    session_id: session_id.as_str().unwrap_or_default().to_owned(),
                }
            }
            Ok(false) => {
                info!("User denied access.");
                AuthOutcome::Denied
            }
            Err(e) => {
                warn!("Session validation failed, denying access: {e}");
                AuthOutcome::Denied
            }
        }
    }
}
