use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::MySqlPool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Composition root. Every adapter and service is built once here and
/// handed to the HTTP layer by `Arc`.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub authenticator: Arc<RequestAuthenticator>,
    pub user_service: Arc<dyn UserService>,
    pub entry_service: Arc<dyn EntryService>,
    pool: Option<MySqlPool>,
    purge_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let mut purge_handle = None;
        let session_store: Arc<dyn SessionStore> = match settings.session_store.backend.as_str()
        {
            "memory" => {
                let store = Arc::new(MemorySessionStore::new());
                purge_handle = Some(tokio::spawn(purge_periodically(store.clone())));
                store
            }
            "redis" => {
                let dsn = settings
                    .session_store
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("session_store.redis_dsn is required"))?;
                let prefix = settings.session_store.prefix.clone();
                Arc::new(RedisSessionStore::connect(dsn, prefix).await?)
            }
            other => return Err(anyhow::anyhow!("Unknown session store backend: {}", other)),
        };

        let (user_repo, entry_repo, pool): (
            Arc<dyn UserRepo>,
            Arc<dyn EntryRepo>,
            Option<MySqlPool>,
        ) = match settings.storage.backend.as_str() {
            "memory" => (
                Arc::new(MemoryUserRepo::new()),
                Arc::new(MemoryEntryRepo::new()),
                None,
            ),
            "mysql" => {
                let dsn = settings
                    .storage
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("storage.mysql_dsn is required"))?;
                let pool = MySqlPool::connect(dsn).await?;
                (
                    Arc::new(MySqlUserRepo::new(pool.clone())),
                    Arc::new(MySqlEntryRepo::new(pool.clone())),
                    Some(pool),
                )
            }
            other => return Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        };

        let token_issuer: Arc<dyn TokenIssuer> = Arc::new(JwtTokenIssuer::try_new(JwtConfig {
            issuer: settings.auth.issuer.clone(),
            access_ttl: settings.auth.access_ttl(),
            refresh_ttl: settings.auth.refresh_ttl(),
            access_secret: settings.auth.access_secret.clone().into_bytes(),
            refresh_secret: settings.auth.refresh_secret.clone().into_bytes(),
        })?);

        let session_manager: Arc<dyn SessionManager> = Arc::new(
            RealSessionManager::new(token_issuer, session_store)
                .with_store_timeout(settings.auth.store_timeout()),
        );

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            credential_hasher,
            session_manager.clone(),
        ));
        let authenticator = Arc::new(RequestAuthenticator::new(session_manager));
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(user_repo));
        let entry_service: Arc<dyn EntryService> = Arc::new(RealEntryService::new(entry_repo));

        info!(
            session_store = %settings.session_store.backend,
            storage = %settings.storage.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            authenticator,
            user_service,
            entry_service,
            pool,
            purge_handle: Mutex::new(purge_handle),
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        let purge_handle = self.purge_handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = purge_handle {
            handle.abort();
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Lazy eviction only covers records that are read again.
async fn purge_periodically(store: Arc<MemorySessionStore>) {
    let mut interval = tokio::time::interval(PURGE_INTERVAL);
    loop {
        interval.tick().await;
        let purged = store.purge_expired();
        if purged > 0 {
            debug!(purged, "expired sessions purged");
        }
    }
}
