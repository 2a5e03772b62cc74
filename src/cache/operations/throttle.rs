use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use redis::Client as RedisClient;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cache::keys;
use crate::error::AppError;

/// 需要按来源去重计数的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleAction {
    View,
    Like,
    Dislike,
}

impl ThrottleAction {
    pub fn prefix(self) -> &'static str {
        match self {
            ThrottleAction::View => "remote-ips-post",
            ThrottleAction::Like => "like-remote-ips-post",
            ThrottleAction::Dislike => "dislike-remote-ips-post",
        }
    }
}

/// 节流存储
///
/// `check_and_mark` 必须是一次原子的"检查并写入"：键不存在（或已过期）时写入并返回
/// `true`，已存在时返回 `false` 且不改动任何状态。并发的同键调用最多只有一个得到 `true`。
#[async_trait]
pub trait ThrottleStore: Send + Sync {
    async fn check_and_mark(&self, key: &str) -> Result<bool, AppError>;
}

/// 进程内节流存储
pub struct MemoryThrottle {
    entries: DashMap<String, Instant>,
    ttl: Duration,
}

impl MemoryThrottle {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn check_and_mark_at(&self, key: &str, now: Instant) -> bool {
        // entry 持有分片写锁，检查与写入之间不会被其他请求插入
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    false
                } else {
                    entry.insert(now + self.ttl);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now + self.ttl);
                true
            }
        }
    }

    /// 清理已过期的记录
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, deadline| *deadline > now);
        before - self.entries.len()
    }

    /// 启动定期清理任务，由服务在关闭时中止
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let throttle = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = throttle.purge_expired();
                if purged > 0 {
                    tracing::debug!("Purged {} expired throttle entries", purged);
                }
            }
        })
    }
}

#[async_trait]
impl ThrottleStore for MemoryThrottle {
    async fn check_and_mark(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.check_and_mark_at(key, Instant::now()))
    }
}

/// 基于 Redis 的节流存储，`SET NX EX` 在服务端原子完成
pub struct RedisThrottle {
    redis: Arc<RedisClient>,
    ttl: Duration,
}

impl RedisThrottle {
    pub fn new(redis: Arc<RedisClient>, ttl: Duration) -> Self {
        Self { redis, ttl }
    }
}

#[async_trait]
impl ThrottleStore for RedisThrottle {
    async fn check_and_mark(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let reply: Option<String> = redis::cmd("SET")
            .arg(keys::redis_throttle_key(key))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    #[tokio::test]
    async fn first_action_is_counted_once() {
        let throttle = MemoryThrottle::new(DAY);
        assert!(throttle.check_and_mark("like-remote-ips-post-1-10.0.0.1").await.unwrap());
        assert!(!throttle.check_and_mark("like-remote-ips-post-1-10.0.0.1").await.unwrap());
        assert!(!throttle.check_and_mark("like-remote-ips-post-1-10.0.0.1").await.unwrap());
        // 其他来源不受影响
        assert!(throttle.check_and_mark("like-remote-ips-post-1-10.0.0.2").await.unwrap());
        assert_eq!(throttle.entries.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn key_is_absent_again_after_window() {
        let throttle = MemoryThrottle::new(DAY);
        assert!(throttle.check_and_mark("k").await.unwrap());

        tokio::time::advance(DAY - Duration::from_secs(1)).await;
        assert!(!throttle.check_and_mark("k").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(throttle.check_and_mark("k").await.unwrap());
        assert!(!throttle.check_and_mark("k").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let throttle = MemoryThrottle::new(Duration::from_secs(60));
        throttle.check_and_mark("old").await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        throttle.check_and_mark("new").await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(throttle.purge_expired(), 1);
        assert_eq!(throttle.entries.len(), 1);
        assert!(!throttle.check_and_mark("new").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_marks_admit_exactly_one() {
        let throttle = Arc::new(MemoryThrottle::new(DAY));
        let tasks = (0..64).map(|_| {
            let throttle = Arc::clone(&throttle);
            tokio::spawn(async move { throttle.check_and_mark("remote-ips-post-9-1.1.1.1").await })
        });

        let admitted = futures_util::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .filter(|allowed| *allowed)
            .count();
        assert_eq!(admitted, 1);
    }
}
