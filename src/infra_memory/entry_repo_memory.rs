use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{Datelike, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct MemoryEntryRepo {
    entries: DashMap<EntryId, Entry>,
    seq: AtomicU64,
}

impl MemoryEntryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EntryRepo for MemoryEntryRepo {
    async fn insert(&self, entry: NewEntry) -> Result<Entry, RepoError> {
        let now = Utc::now();
        let created = Entry {
            id: EntryId(self.seq.fetch_add(1, Ordering::Relaxed) + 1),
            owner_id: entry.owner_id,
            title: entry.title,
            description: entry.description,
            created_at: now,
            updated_at: now,
        };
        self.entries.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, entry_id: EntryId) -> Result<Option<Entry>, RepoError> {
        Ok(self.entries.get(&entry_id).map(|r| r.value().clone()))
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        query: &EntryQuery,
    ) -> Result<Vec<Entry>, RepoError> {
        let mut matching: Vec<Entry> = self
            .entries
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| query.year_from.is_none_or(|y| r.created_at.year() >= y))
            .filter(|r| query.year_to.is_none_or(|y| r.created_at.year() <= y))
            .map(|r| r.value().clone())
            .collect();

        matching.sort_by_key(|e| (e.created_at, e.id));
        if query.sort == SortOrder::Desc {
            matching.reverse();
        }

        Ok(matching
            .into_iter()
            .skip(query.offset() as usize)
            .take(usize::from(query.page_size.0))
            .collect())
    }

    async fn update(
        &self,
        entry_id: EntryId,
        title: &str,
        description: &str,
    ) -> Result<Option<Entry>, RepoError> {
        Ok(self.entries.get_mut(&entry_id).map(|mut r| {
            r.title = title.to_string();
            r.description = description.to_string();
            r.updated_at = Utc::now();
            r.value().clone()
        }))
    }

    async fn delete(&self, entry_id: EntryId) -> Result<u64, RepoError> {
        Ok(self.entries.remove(&entry_id).map_or(0, |_| 1))
    }
}
