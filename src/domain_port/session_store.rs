use crate::domain_model::*;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt session record: {0}")]
    Corrupt(String),
}

/// Session id -> user id records with per-key expiry.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Write a record that the store drops on its own after `ttl`.
    async fn put(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), SessionStoreError>;

    async fn get(&self, session_id: &SessionId) -> Result<Option<UserId>, SessionStoreError>;

    /// Returns the number of records removed (0 or 1).
    async fn delete(&self, session_id: &SessionId) -> Result<u64, SessionStoreError>;
}
