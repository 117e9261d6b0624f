use crate::application_port::*;
use crate::logger::*;
use std::sync::Arc;

/// The only outcome a client ever sees when authentication fails.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("unauthorized")]
pub struct Unauthorized;

const BEARER: &str = "Bearer";

pub struct RequestAuthenticator {
    sessions: Arc<dyn SessionManager>,
}

impl RequestAuthenticator {
    pub fn new(sessions: Arc<dyn SessionManager>) -> Self {
        RequestAuthenticator { sessions }
    }

    /// Resolve the raw `Authorization` header value to a live session.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedSession, Unauthorized> {
        let Some(token) = extract_bearer(authorization) else {
            debug!("request without bearer token");
            return Err(Unauthorized);
        };

        match self.sessions.validate_access(token).await {
            Ok(session) => Ok(session),
            Err(e) if e.is_internal() => {
                warn!("authentication failed closed: {}", e);
                Err(Unauthorized)
            }
            Err(e) => {
                debug!("authentication rejected: {}", e);
                Err(Unauthorized)
            }
        }
    }
}

/// Auth schemes are case-insensitive.
fn extract_bearer(authorization: Option<&str>) -> Option<&str> {
    let (scheme, token) = authorization?.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}
