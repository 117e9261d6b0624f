use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

const MAX_TITLE_LEN: usize = 255;

pub struct RealEntryService {
    entry_repo: Arc<dyn EntryRepo>,
}

impl RealEntryService {
    pub fn new(entry_repo: Arc<dyn EntryRepo>) -> Self {
        RealEntryService { entry_repo }
    }

    fn validate(input: &EntryInput) -> Result<(), EntryError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(EntryError::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(EntryError::Validation(format!(
                "title longer than {} characters",
                MAX_TITLE_LEN
            )));
        }
        if input.description.trim().is_empty() {
            return Err(EntryError::Validation("description is required".to_string()));
        }
        Ok(())
    }

    /// Fetch an entry that the caller is about to change.
    async fn owned(&self, owner: UserId, entry_id: EntryId) -> Result<Entry, EntryError> {
        let entry = self
            .entry_repo
            .get(entry_id)
            .await?
            .ok_or(EntryError::NotFound)?;
        if entry.owner_id != owner {
            warn!(%entry_id, %owner, "attempt to modify another user's entry");
            return Err(EntryError::Forbidden);
        }
        Ok(entry)
    }
}

#[async_trait::async_trait]
impl EntryService for RealEntryService {
    async fn create(&self, owner: UserId, input: EntryInput) -> Result<Entry, EntryError> {
        Self::validate(&input)?;
        let entry = self
            .entry_repo
            .insert(NewEntry {
                owner_id: owner,
                title: input.title.trim().to_string(),
                description: input.description,
            })
            .await?;
        debug!(entry_id = %entry.id, %owner, "entry created");
        Ok(entry)
    }

    async fn get(&self, owner: UserId, entry_id: EntryId) -> Result<Entry, EntryError> {
        // Other owners' entries are indistinguishable from missing ones.
        self.entry_repo
            .get(entry_id)
            .await?
            .filter(|entry| entry.owner_id == owner)
            .ok_or(EntryError::NotFound)
    }

    async fn list(&self, owner: UserId, query: EntryQuery) -> Result<Vec<Entry>, EntryError> {
        let query = EntryQuery {
            page_size: query.page_size.clamped(),
            page: query.page.max(1),
            ..query
        };
        Ok(self.entry_repo.list_by_owner(owner, &query).await?)
    }

    async fn update(
        &self,
        owner: UserId,
        entry_id: EntryId,
        input: EntryInput,
    ) -> Result<Entry, EntryError> {
        Self::validate(&input)?;
        self.owned(owner, entry_id).await?;
        self.entry_repo
            .update(entry_id, input.title.trim(), &input.description)
            .await?
            .ok_or(EntryError::NotFound)
    }

    async fn delete(&self, owner: UserId, entry_id: EntryId) -> Result<u64, EntryError> {
        self.owned(owner, entry_id).await?;
        let deleted = self.entry_repo.delete(entry_id).await?;
        debug!(%entry_id, %owner, "entry deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryEntryRepo;

    fn service() -> RealEntryService {
        RealEntryService::new(Arc::new(MemoryEntryRepo::new()))
    }

    fn input(title: &str, description: &str) -> EntryInput {
        EntryInput {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let service = service();
        assert!(matches!(
            service.create(UserId(1), input("  ", "body")).await,
            Err(EntryError::Validation(_))
        ));
        assert!(matches!(
            service.create(UserId(1), input("title", "")).await,
            Err(EntryError::Validation(_))
        ));
        assert!(matches!(
            service.create(UserId(1), input(&"x".repeat(256), "body")).await,
            Err(EntryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn only_the_owner_can_touch_an_entry() {
        let service = service();
        let entry = service
            .create(UserId(1), input("day one", "it rained"))
            .await
            .unwrap();

        assert!(matches!(
            service.get(UserId(2), entry.id).await,
            Err(EntryError::NotFound)
        ));
        assert!(matches!(
            service.update(UserId(2), entry.id, input("mine now", "x")).await,
            Err(EntryError::Forbidden)
        ));
        assert!(matches!(
            service.delete(UserId(2), entry.id).await,
            Err(EntryError::Forbidden)
        ));

        let updated = service
            .update(UserId(1), entry.id, input("day one", "it rained a lot"))
            .await
            .unwrap();
        assert_eq!(updated.description, "it rained a lot");
        assert_eq!(updated.owner_id, UserId(1));

        assert_eq!(service.delete(UserId(1), entry.id).await.unwrap(), 1);
        assert!(matches!(
            service.get(UserId(1), entry.id).await,
            Err(EntryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn listing_is_scoped_and_paged() {
        let service = service();
        for i in 0..5 {
            service
                .create(UserId(1), input(&format!("entry {}", i), "text"))
                .await
                .unwrap();
        }
        service
            .create(UserId(2), input("someone else", "text"))
            .await
            .unwrap();

        let all = service
            .list(UserId(1), EntryQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|e| e.owner_id == UserId(1)));

        let second_page = service
            .list(
                UserId(1),
                EntryQuery {
                    page_size: PageSize(2),
                    page: 2,
                    sort: SortOrder::Asc,
                    ..EntryQuery::default()
                },
            )
            .await
            .unwrap();
        let titles: Vec<&str> = second_page.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["entry 2", "entry 3"]);
    }
}
