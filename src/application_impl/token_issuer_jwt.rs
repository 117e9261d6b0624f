use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl JwtConfig {
    pub fn new(
        issuer: impl Into<String>,
        access_secret: impl Into<Vec<u8>>,
        refresh_secret: impl Into<Vec<u8>>,
    ) -> Self {
        JwtConfig {
            issuer: issuer.into(),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String, // user id
    sid: String, // session id, the store key
    exp: i64,
    iat: i64,
    iss: String,
    aud: String, // "<issuer>.access" or "<issuer>.refresh"
}

/// Keys and validation rules of one token class.
struct TokenClass {
    audience: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenClass {
    fn new(issuer: &str, audience: String, secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        TokenClass {
            audience,
            ttl,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

/// HS256 issuer with one secret per token class, so an access token never
/// verifies as a refresh token and vice versa.
pub struct JwtTokenIssuer {
    issuer: String,
    access: TokenClass,
    refresh: TokenClass,
}

impl JwtTokenIssuer {
    pub fn try_new(cfg: JwtConfig) -> Result<Self, SessionError> {
        if cfg.access_secret.is_empty() || cfg.refresh_secret.is_empty() {
            return Err(SessionError::Signing("signing secret not configured".into()));
        }
        if cfg.access_secret == cfg.refresh_secret {
            return Err(SessionError::Signing(
                "access and refresh secrets must differ".into(),
            ));
        }

        let access = TokenClass::new(
            &cfg.issuer,
            format!("{}.access", cfg.issuer),
            &cfg.access_secret,
            cfg.access_ttl,
        );
        let refresh = TokenClass::new(
            &cfg.issuer,
            format!("{}.refresh", cfg.issuer),
            &cfg.refresh_secret,
            cfg.refresh_ttl,
        );

        Ok(JwtTokenIssuer {
            issuer: cfg.issuer,
            access,
            refresh,
        })
    }

    /// Mint a pair as if the current time were `now`.
    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<TokenPair, SessionError> {
        let access_session_id = SessionId::generate();
        let refresh_session_id = SessionId::generate();

        let (access_token, access_expires_at) =
            self.encode(&self.access, user_id, access_session_id, now)?;
        let (refresh_token, refresh_expires_at) =
            self.encode(&self.refresh, user_id, refresh_session_id, now)?;

        Ok(TokenPair {
            access_token: AccessToken(access_token),
            access_session_id,
            access_expires_at,
            refresh_token: RefreshToken(refresh_token),
            refresh_session_id,
            refresh_expires_at,
        })
    }

    fn encode(
        &self,
        class: &TokenClass,
        user_id: UserId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), SessionError> {
        let ttl = TimeDelta::from_std(class.ttl).map_err(|e| SessionError::Signing(e.to_string()))?;
        let exp_dt = now + ttl;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            exp: exp_dt.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            aud: class.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &class.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))?;
        Ok((token, exp_dt))
    }

    fn decode(&self, class: &TokenClass, token: &str) -> Result<VerifiedClaims, SessionError> {
        let claims = decode::<SessionClaims>(token, &class.decoding_key, &class.validation)
            .map_err(classify)?
            .claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(SessionError::Malformed)?;
        // The library tolerates exp == now.
        if expires_at <= Utc::now() {
            return Err(SessionError::Expired);
        }

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| SessionError::Malformed)?;
        let session_id = claims
            .sid
            .parse::<SessionId>()
            .map_err(|_| SessionError::Malformed)?;

        Ok(VerifiedClaims {
            user_id,
            session_id,
            expires_at,
        })
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> SessionError {
    match error.kind() {
        ErrorKind::ExpiredSignature => SessionError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => SessionError::SignatureInvalid,
        _ => SessionError::Malformed,
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user_id: UserId) -> Result<TokenPair, SessionError> {
        self.issue_at(user_id, Utc::now())
    }

    fn verify_access(&self, token: &str) -> Result<VerifiedClaims, SessionError> {
        self.decode(&self.access, token)
    }

    fn verify_refresh(&self, token: &str) -> Result<VerifiedClaims, SessionError> {
        self.decode(&self.refresh, token)
    }
}
