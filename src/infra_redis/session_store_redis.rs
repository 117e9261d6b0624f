use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, ToRedisArgs, Value,
};
use std::time::Duration;

/// Session records as `SET <prefix>:<session id> <user id> EX <ttl>`.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    pub async fn connect(dsn: &str, prefix: impl Into<String>) -> RedisResult<Self> {
        let client = redis::Client::open(dsn)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self::new(conn, prefix))
    }

    fn key(&self, session_id: &SessionId) -> String {
        format!("{}:{}", self.prefix, session_id)
    }

    /// Redis expiry has second granularity and rejects zero.
    fn ttl_secs(ttl: Duration) -> u64 {
        ttl.as_secs().max(1)
    }
}

impl ToRedisArgs for UserId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for UserId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let user_id = s.parse::<UserId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid UserId string",
                e.to_string(),
            ))
        })?;
        Ok(user_id)
    }
}

fn store_error(e: RedisError) -> SessionStoreError {
    if e.kind() == redis::ErrorKind::TypeError {
        SessionStoreError::Corrupt(e.to_string())
    } else {
        SessionStoreError::Unavailable(e.to_string())
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(
        &self,
        session_id: &SessionId,
        user_id: UserId,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, &user_id, Self::ttl_secs(ttl))
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<UserId>, SessionStoreError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        conn.get(&key).await.map_err(store_error)
    }

    async fn delete(&self, session_id: &SessionId) -> Result<u64, SessionStoreError> {
        let key = self.key(session_id);
        let mut conn = self.conn.clone();
        conn.del(&key).await.map_err(store_error)
    }
}
