use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    password_hash: String,
}

#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, UserRow>,
    by_email: DashMap<String, UserId>,
    seq: AtomicU64,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        match self.by_email.entry(user.email.clone()) {
            MapEntry::Occupied(_) => Err(RepoError::Duplicate),
            MapEntry::Vacant(slot) => {
                let user_id = UserId(self.seq.fetch_add(1, Ordering::Relaxed) + 1);
                let row = UserRow {
                    user: User {
                        id: user_id,
                        name: user.name,
                        email: user.email,
                        created_at: Utc::now(),
                    },
                    password_hash: user.password_hash,
                };
                let created = row.user.clone();
                self.users.insert(user_id, row);
                slot.insert(user_id);
                Ok(created)
            }
        }
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(&user_id).map(|r| r.user.clone()))
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentialsRecord>, RepoError> {
        let Some(user_id) = self.by_email.get(email).map(|r| *r.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|r| UserCredentialsRecord {
            user_id,
            email: r.user.email.clone(),
            password_hash: r.password_hash.clone(),
        }))
    }
}
