use super::RepoError;
use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserCredentialsRecord {
    pub user_id: UserId,
    pub email: String,
    pub password_hash: String,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `RepoError::Duplicate` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>, RepoError>;

    /// Fetch credentials by email (for login).
    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, RepoError>;
}
