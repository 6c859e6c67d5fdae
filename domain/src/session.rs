//! Session validation against the website's session store.

use crate::error::Error;
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use serde_json::Value;

/// Read access to the website's login sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Number of stored sessions with this id. Every call queries the store.
    async fn count_sessions(&self, session_id: &str) -> Result<u64, Error>;
}

#[async_trait]
impl SessionStore for DatabaseConnection {
    async fn count_sessions(&self, session_id: &str) -> Result<u64, Error> {
        Ok(entity_api::session::count_by_id(self, session_id).await?)
    }
}

/// Answers whether `session_id` currently names a stored session.
///
/// A session id that is not a JSON string is rejected with an invalid input
/// error before the store is consulted. Store failures are returned as errors,
/// never turned into `false` or `true` here. The answer is not cached, so it
/// can race with the session expiring right after the query.
pub async fn is_valid<S>(store: &S, session_id: &Value) -> Result<bool, Error>
where
    S: SessionStore + ?Sized,
{
    let id = session_id
        .as_str()
        .ok_or_else(|| Error::invalid_input("session id is not a string"))?;

    Ok(store.count_sessions(id).await? > 0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use entity_api::error::{EntityApiErrorKind, Error as EntityApiError};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory session store that counts how often it is queried.
    #[derive(Default)]
    pub(crate) struct FakeSessionStore {
        pub sessions: HashSet<String>,
        pub fail: bool,
        pub queries: AtomicUsize,
    }

    impl FakeSessionStore {
        pub(crate) fn with_sessions(ids: &[&str]) -> Self {
            Self {
                sessions: ids.iter().map(|id| id.to_string()).collect(),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn query_count(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionStore for FakeSessionStore {
        async fn count_sessions(&self, session_id: &str) -> Result<u64, Error> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EntityApiError {
                    source: None,
                    error_kind: EntityApiErrorKind::SystemError,
                }
                .into());
            }
            Ok(u64::from(self.sessions.contains(session_id)))
        }
    }

    #[tokio::test]
    async fn stored_sessions_are_valid() {
        let store = FakeSessionStore::with_sessions(&["abc"]);

        assert!(is_valid(&store, &json!("abc")).await.unwrap());
        assert_eq!(store.query_count(), 1);
    }

    #[tokio::test]
    async fn unknown_sessions_are_invalid() {
        let store = FakeSessionStore::with_sessions(&["abc"]);

        assert!(!is_valid(&store, &json!("xyz")).await.unwrap());
    }

    #[tokio::test]
    async fn non_string_ids_are_rejected_without_querying_the_store() {
        let store = FakeSessionStore::with_sessions(&["42"]);

        for id in [json!(42), json!(null), json!(true), json!(["abc"]), json!({"id": "abc"})] {
            let err = is_valid(&store, &id).await.unwrap_err();
            assert!(matches!(
                err.error_kind,
                DomainErrorKind::Internal(InternalErrorKind::InvalidInput(_))
            ));
        }

        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn store_failures_are_propagated() {
        let store = FakeSessionStore::failing();

        let err = is_valid(&store, &json!("abc")).await.unwrap_err();

        assert!(err.is_store_error());
    }

    #[tokio::test]
    async fn every_call_queries_the_store() {
        let store = FakeSessionStore::with_sessions(&["abc"]);

        for _ in 0..3 {
            is_valid(&store, &json!("abc")).await.unwrap();
        }

        assert_eq!(store.query_count(), 3);
    }
}
