use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::task::JoinHandle;

use crate::cache::keys;
use crate::cache::models::session::{CachedSession, SessionUser};
use crate::error::AppError;

/// 会话存储
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 创建会话，返回会话令牌
    async fn create(&self, user: &SessionUser) -> Result<String, AppError>;

    /// 获取未过期的会话
    async fn get(&self, session_id: &str) -> Result<Option<CachedSession>, AppError>;

    async fn remove(&self, session_id: &str) -> Result<(), AppError>;
}

fn new_session(user: &SessionUser, ttl: Duration) -> CachedSession {
    let now = chrono::Utc::now().timestamp();
    CachedSession {
        session_id: uuid::Uuid::new_v4().simple().to_string(),
        user: user.clone(),
        created_at: now,
        expires_at: now + ttl.as_secs() as i64,
    }
}

/// 进程内会话存储
pub struct MemorySessionStore {
    sessions: DashMap<String, CachedSession>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn purge_expired(&self) {
        let now = chrono::Utc::now().timestamp();
        self.sessions.retain(|_, session| !session.is_expired(now));
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                store.purge_expired();
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user: &SessionUser) -> Result<String, AppError> {
        let session = new_session(user, self.ttl);
        let session_id = session.session_id.clone();
        self.sessions.insert(session_id.clone(), session);
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<CachedSession>, AppError> {
        let now = chrono::Utc::now().timestamp();
        let session = self.sessions.get(session_id).map(|s| s.value().clone());
        match session {
            Some(session) if session.is_expired(now) => {
                self.sessions.remove(session_id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn remove(&self, session_id: &str) -> Result<(), AppError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}

/// 基于 Redis 的会话存储
pub struct RedisSessionStore {
    redis: Arc<RedisClient>,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(redis: Arc<RedisClient>, ttl: Duration) -> Self {
        Self { redis, ttl }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, user: &SessionUser) -> Result<String, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let session = new_session(user, self.ttl);
        let json = serde_json::to_string(&session).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::IoError, "Serialization error", e.to_string()))
        })?;

        let _: () = conn
            .set_ex(keys::session_key(&session.session_id), json, self.ttl.as_secs().max(1))
            .await?;

        Ok(session.session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<CachedSession>, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(keys::session_key(session_id)).await?;
        match result {
            Some(json) => {
                let session = serde_json::from_str(&json).map_err(|e| {
                    redis::RedisError::from((
                        redis::ErrorKind::IoError,
                        "Deserialization error",
                        e.to_string(),
                    ))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, session_id: &str) -> Result<(), AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let _: () = conn.del(keys::session_key(session_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> SessionUser {
        SessionUser {
            user_id: 1,
            name: "alice".into(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn created_session_can_be_read_back_and_removed() {
        let store = MemorySessionStore::new(Duration::from_secs(3600));
        let token = store.create(&alice()).await.unwrap();

        let session = store.get(&token).await.unwrap().unwrap();
        assert_eq!(session.user, alice());
        assert!(store.get("missing").await.unwrap().is_none());

        store.remove(&token).await.unwrap();
        assert!(store.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let store = MemorySessionStore::new(Duration::ZERO);
        let token = store.create(&alice()).await.unwrap();
        assert!(store.get(&token).await.unwrap().is_none());
    }
}
