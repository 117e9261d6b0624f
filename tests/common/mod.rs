#![allow(dead_code)]

use diary::application_impl::*;
use diary::application_port::*;
use diary::domain_model::*;
use diary::domain_port::*;
use diary::infra_memory::MemorySessionStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

pub fn issuer() -> Arc<JwtTokenIssuer> {
    let config = JwtConfig::new("diary.test", ACCESS_SECRET, REFRESH_SECRET);
    Arc::new(JwtTokenIssuer::try_new(config).unwrap())
}

pub fn manager_with(store: Arc<dyn SessionStore>) -> RealSessionManager {
    RealSessionManager::new(issuer(), store)
}

pub fn memory_manager() -> (RealSessionManager, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    (manager_with(store.clone()), store)
}

/// Every call fails as if the backend were down.
pub struct FailingSessionStore;

#[async_trait::async_trait]
impl SessionStore for FailingSessionStore {
    async fn put(&self, _: &SessionId, _: UserId, _: Duration) -> Result<(), SessionStoreError> {
        Err(SessionStoreError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _: &SessionId) -> Result<Option<UserId>, SessionStoreError> {
        Err(SessionStoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _: &SessionId) -> Result<u64, SessionStoreError> {
        Err(SessionStoreError::Unavailable("connection refused".into()))
    }
}

/// Delegates to an inner store after sleeping on every call.
pub struct SlowSessionStore {
    pub inner: MemorySessionStore,
    pub delay: Duration,
}

#[async_trait::async_trait]
impl SessionStore for SlowSessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(session_id, user_id, ttl).await
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<UserId>, SessionStoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(session_id).await
    }

    async fn delete(&self, session_id: &SessionId) -> Result<u64, SessionStoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete(session_id).await
    }
}

/// Accepts the first `allowed_puts` writes, then fails every later one.
pub struct FlakySessionStore {
    pub inner: MemorySessionStore,
    pub allowed_puts: usize,
    puts: AtomicUsize,
}

impl FlakySessionStore {
    pub fn new(allowed_puts: usize) -> Self {
        FlakySessionStore {
            inner: MemorySessionStore::new(),
            allowed_puts,
            puts: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl SessionStore for FlakySessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        if self.puts.fetch_add(1, Ordering::SeqCst) >= self.allowed_puts {
            return Err(SessionStoreError::Unavailable("write rejected".into()));
        }
        self.inner.put(session_id, user_id, ttl).await
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<UserId>, SessionStoreError> {
        self.inner.get(session_id).await
    }

    async fn delete(&self, session_id: &SessionId) -> Result<u64, SessionStoreError> {
        self.inner.delete(session_id).await
    }
}

pub fn bearer(tokens: &TokenPair) -> String {
    format!("Bearer {}", tokens.access_token.0)
}
