use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);

/// Session lifecycle on top of a token issuer and a session store.
///
/// Holds no mutable state of its own: the store is the only source of truth
/// for whether a session is live, so a token whose signature still verifies
/// is rejected as soon as its record is gone.
#[derive(Clone)]
pub struct RealSessionManager {
    issuer: Arc<dyn TokenIssuer>,
    store: Arc<dyn SessionStore>,
    store_timeout: Duration,
}

impl RealSessionManager {
    pub fn new(issuer: Arc<dyn TokenIssuer>, store: Arc<dyn SessionStore>) -> Self {
        RealSessionManager {
            issuer,
            store,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Whole seconds left on a freshly minted token. Rounds down so the
    /// record never outlives the token.
    fn ttl_until(until: DateTime<Utc>) -> Result<Duration, SessionError> {
        match u64::try_from((until - Utc::now()).num_seconds()) {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(SessionError::Signing(
                "token lifetime too short to store a session".into(),
            )),
        }
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionStoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result.map_err(SessionError::from),
            Err(_) => Err(SessionError::Store(format!(
                "{} timed out after {:?}",
                op, self.store_timeout
            ))),
        }
    }

    async fn look_up(&self, claims: &VerifiedClaims) -> Result<UserId, SessionError> {
        let stored = self
            .bounded("get", self.store.get(&claims.session_id))
            .await?
            .ok_or(SessionError::Revoked)?;

        if stored != claims.user_id {
            warn!(
                session_id = %claims.session_id,
                claim_user_id = %claims.user_id,
                stored_user_id = %stored,
                "session record disagrees with token claim, using stored identity"
            );
        }
        Ok(stored)
    }

    async fn persist(&self, user_id: UserId) -> Result<TokenPair, SessionError> {
        let pair = self.issuer.issue(user_id)?;
        let access_ttl = Self::ttl_until(pair.access_expires_at)?;
        let refresh_ttl = Self::ttl_until(pair.refresh_expires_at)?;

        self.bounded(
            "put access",
            self.store.put(&pair.access_session_id, user_id, access_ttl),
        )
        .await?;

        if let Err(e) = self
            .bounded(
                "put refresh",
                self.store.put(&pair.refresh_session_id, user_id, refresh_ttl),
            )
            .await
        {
            // The access record would expire by itself; drop it now anyway.
            if let Err(cleanup) = self
                .bounded("delete access", self.store.delete(&pair.access_session_id))
                .await
            {
                warn!(session_id = %pair.access_session_id, "orphaned access session: {}", cleanup);
            }
            return Err(e);
        }

        debug!(
            %user_id,
            access_session_id = %pair.access_session_id,
            refresh_session_id = %pair.refresh_session_id,
            "session created"
        );
        Ok(pair)
    }

    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let claims = self.issuer.verify_refresh(refresh_token)?;
        let user_id = self.look_up(&claims).await?;

        // Losing a concurrent rotation shows up as nothing to delete.
        let deleted = self
            .bounded("delete refresh", self.store.delete(&claims.session_id))
            .await?;
        if deleted == 0 {
            return Err(SessionError::Revoked);
        }

        self.persist(user_id).await
    }

    /// Store writes run on their own task so that a dropped request cannot
    /// stop them halfway.
    async fn detached<T, F>(fut: F) -> Result<T, SessionError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, SessionError>> + Send + 'static,
    {
        tokio::spawn(fut)
            .await
            .map_err(|e| SessionError::Store(format!("session task failed: {}", e)))?
    }
}

#[async_trait::async_trait]
impl SessionManager for RealSessionManager {
    async fn create_session(&self, user_id: UserId) -> Result<TokenPair, SessionError> {
        let this = self.clone();
        Self::detached(async move { this.persist(user_id).await }).await
    }

    async fn validate_access(&self, token: &str) -> Result<AuthenticatedSession, SessionError> {
        let claims = self.issuer.verify_access(token)?;
        let user_id = self.look_up(&claims).await?;
        Ok(AuthenticatedSession {
            user_id,
            session_id: claims.session_id,
        })
    }

    async fn revoke(&self, session_id: SessionId) -> Result<u64, SessionError> {
        let deleted = self
            .bounded("delete", self.store.delete(&session_id))
            .await?;
        debug!(%session_id, deleted, "session revoked");
        Ok(deleted)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError> {
        let this = self.clone();
        let refresh_token = refresh_token.to_owned();
        Self::detached(async move { this.rotate(&refresh_token).await }).await
    }
}
