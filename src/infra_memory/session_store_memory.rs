use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct SessionRecord {
    user_id: UserId,
    expires_at: Instant,
}

/// Expired records read as absent and are evicted lazily on access or by
/// `purge_expired`.
#[derive(Default)]
pub struct MemorySessionStore {
    records: DashMap<SessionId, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| record.expires_at > now);
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        self.records.insert(
            *session_id,
            SessionRecord {
                user_id,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<UserId>, SessionStoreError> {
        let now = Instant::now();
        let record = self.records.get(session_id).map(|r| *r.value());
        match record {
            Some(record) if record.expires_at > now => Ok(Some(record.user_id)),
            Some(_) => {
                self.records
                    .remove_if(session_id, |_, record| record.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &SessionId) -> Result<u64, SessionStoreError> {
        let now = Instant::now();
        match self.records.remove(session_id) {
            Some((_, record)) if record.expires_at > now => Ok(1),
            _ => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemorySessionStore::new();
        let sid = SessionId::generate();

        assert_eq!(store.get(&sid).await.unwrap(), None);
        store.put(&sid, UserId(9), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get(&sid).await.unwrap(), Some(UserId(9)));

        assert_eq!(store.delete(&sid).await.unwrap(), 1);
        assert_eq!(store.delete(&sid).await.unwrap(), 0);
        assert_eq!(store.get(&sid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn records_expire() {
        let store = MemorySessionStore::new();
        let short = SessionId::generate();
        let long = SessionId::generate();
        store.put(&short, UserId(1), Duration::from_millis(20)).await.unwrap();
        store.put(&long, UserId(1), Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.get(&short).await.unwrap(), None);
        assert_eq!(store.delete(&short).await.unwrap(), 0);
        assert_eq!(store.get(&long).await.unwrap(), Some(UserId(1)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn expired_record_deletes_as_absent() {
        let store = MemorySessionStore::new();
        let sid = SessionId::generate();
        store.put(&sid, UserId(1), Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(store.delete(&sid).await.unwrap(), 0);
        assert!(store.is_empty());
    }
}
