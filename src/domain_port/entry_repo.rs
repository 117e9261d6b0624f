use super::RepoError;
use crate::domain_model::*;

#[derive(Debug, Clone)]
pub struct NewEntry {
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
}

/// Persistence for diary entries. Ownership checks live in the service;
/// `get`, `update` and `delete` address an entry by id alone.
#[async_trait::async_trait]
pub trait EntryRepo: Send + Sync {
    async fn insert(&self, entry: NewEntry) -> Result<Entry, RepoError>;

    async fn get(&self, entry_id: EntryId) -> Result<Option<Entry>, RepoError>;

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        query: &EntryQuery,
    ) -> Result<Vec<Entry>, RepoError>;

    async fn update(
        &self,
        entry_id: EntryId,
        title: &str,
        description: &str,
    ) -> Result<Option<Entry>, RepoError>;

    async fn delete(&self, entry_id: EntryId) -> Result<u64, RepoError>;
}
