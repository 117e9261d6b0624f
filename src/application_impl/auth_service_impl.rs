use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    fn hash_blocking(password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    fn verify_blocking(password: &str, password_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {}", e))),
        }
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || Self::hash_blocking(&password))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &password_hash))
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?
    }
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    sessions: Arc<dyn SessionManager>,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        sessions: Arc<dyn SessionManager>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            sessions,
            min_password_len: 6,
        }
    }

    fn validate_signup(&self, request: &SignupInput) -> Result<(), AuthError> {
        if request.name.trim().is_empty() {
            return Err(AuthError::Validation("name is required".to_string()));
        }
        let email = request.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("email is invalid".to_string()));
        }
        if request.password.len() < self.min_password_len {
            return Err(AuthError::Validation("password too short".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        self.validate_signup(&request)?;

        let password_hash = self
            .credential_hasher
            .hash_password(&request.password)
            .await?;
        let user = self
            .user_repo
            .create(NewUser {
                name: request.name.trim().to_string(),
                email: request.email.trim().to_lowercase(),
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "user signed up");
        Ok(user.id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let rec = self
            .user_repo
            .get_credentials_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.sessions.create_session(rec.user_id).await?;
        info!(user_id = %rec.user_id, "user logged in");

        Ok(LoginResult {
            user_id: rec.user_id,
            tokens,
        })
    }

    async fn logout(&self, session_id: SessionId) -> Result<u64, AuthError> {
        Ok(self.sessions.revoke(session_id).await?)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        Ok(self.sessions.refresh(refresh_token).await?)
    }
}
