use crate::domain_model::*;
use crate::domain_port::SessionStoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Failure kinds of token issuance and validation. Callers facing clients
/// must collapse the validation kinds into a single "unauthorized".
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("session revoked")]
    Revoked,
    #[error("store error: {0}")]
    Store(String),
    #[error("signing error: {0}")]
    Signing(String),
}

impl SessionError {
    /// True for kinds that are the server's fault rather than the token's.
    pub fn is_internal(&self) -> bool {
        matches!(self, SessionError::Store(_) | SessionError::Signing(_))
    }
}

impl From<SessionStoreError> for SessionError {
    fn from(error: SessionStoreError) -> Self {
        SessionError::Store(error.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub access_session_id: SessionId,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: RefreshToken,
    pub refresh_session_id: SessionId,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Claims of a token whose signature and expiry have been checked.
#[derive(Debug, Clone)]
pub struct VerifiedClaims {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

/// Identity resolved for a request, backed by a live session record.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct AuthenticatedSession {
    pub user_id: UserId,
    pub session_id: SessionId,
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId) -> Result<TokenPair, SessionError>;
    fn verify_access(&self, token: &str) -> Result<VerifiedClaims, SessionError>;
    fn verify_refresh(&self, token: &str) -> Result<VerifiedClaims, SessionError>;
}

#[async_trait::async_trait]
pub trait SessionManager: Send + Sync {
    async fn create_session(&self, user_id: UserId) -> Result<TokenPair, SessionError>;
    async fn validate_access(&self, token: &str) -> Result<AuthenticatedSession, SessionError>;
    async fn revoke(&self, session_id: SessionId) -> Result<u64, SessionError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, SessionError>;
}
