use crate::domain_model::*;
use crate::domain_port::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("entry not found")]
    NotFound,
    #[error("entry belongs to another user")]
    Forbidden,
    #[error("invalid entry: {0}")]
    Validation(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<RepoError> for EntryError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::Duplicate => EntryError::Store("duplicate entry id".to_string()),
            RepoError::Store(e) => EntryError::Store(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntryInput {
    pub title: String,
    pub description: String,
}

/// Every call carries the identity resolved by request authentication;
/// it is the only owner the service ever acts on behalf of.
#[async_trait::async_trait]
pub trait EntryService: Send + Sync {
    async fn create(&self, owner: UserId, input: EntryInput) -> Result<Entry, EntryError>;
    async fn get(&self, owner: UserId, entry_id: EntryId) -> Result<Entry, EntryError>;
    async fn list(&self, owner: UserId, query: EntryQuery) -> Result<Vec<Entry>, EntryError>;
    async fn update(
        &self,
        owner: UserId,
        entry_id: EntryId,
        input: EntryInput,
    ) -> Result<Entry, EntryError>;
    async fn delete(&self, owner: UserId, entry_id: EntryId) -> Result<u64, EntryError>;
}
