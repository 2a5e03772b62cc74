use std::sync::Arc;

use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;

use crate::AppState;
use crate::cache::{
    MemorySessionStore, MemoryThrottle, RedisSessionStore, RedisThrottle, SessionStore,
    ThrottleStore,
};
use crate::config::Config;
use crate::database::{MemoryStore, PgPostRepository, PgUserRepository, PostRepository, UserRepository};
use crate::error::AppError;
use crate::oauth::GithubClient;

/// 进程内缓存的后台清理任务，随服务关闭而中止
#[derive(Default)]
pub struct Sweepers(Vec<JoinHandle<()>>);

impl Sweepers {
    pub fn shutdown(self) {
        for handle in self.0 {
            handle.abort();
        }
    }
}

impl AppState {
    /// 全部使用进程内实现，测试也通过它注入存储
    pub fn with_memory_store(config: Config, store: Arc<MemoryStore>) -> Self {
        let throttle: Arc<dyn ThrottleStore> = Arc::new(MemoryThrottle::new(config.throttle_window()));
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(config.session_ttl()));
        Self {
            github: GithubClient::new(&config),
            config: Arc::new(config),
            posts: store.clone(),
            users: store,
            throttle,
            sessions,
        }
    }

    /// 按配置连接 PostgreSQL 和 Redis，未配置的部分退回进程内实现
    pub async fn connect(config: Config) -> Result<(Self, Sweepers), AppError> {
        let mut sweepers = Sweepers::default();

        let (posts, users): (Arc<dyn PostRepository>, Arc<dyn UserRepository>) =
            match &config.database_url {
                Some(url) => {
                    let pool = PgPoolOptions::new()
                        .max_connections(10)
                        .after_connect(|conn, _meta| {
                            Box::pin(async move {
                                conn.execute("SET application_name = 'blog_backend';").await?;
                                Ok(())
                            })
                        })
                        .connect(url)
                        .await?;

                    sqlx::migrate!("./migrations")
                        .run(&pool)
                        .await
                        .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;

                    tracing::info!("Connected to Postgres");
                    (
                        Arc::new(PgPostRepository::new(pool.clone())) as Arc<dyn PostRepository>,
                        Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>,
                    )
                }
                None => {
                    tracing::warn!("DATABASE_URL not set, using in-memory store");
                    let store = Arc::new(MemoryStore::new());
                    (
                        store.clone() as Arc<dyn PostRepository>,
                        store as Arc<dyn UserRepository>,
                    )
                }
            };

        let (throttle, sessions): (Arc<dyn ThrottleStore>, Arc<dyn SessionStore>) =
            match &config.redis_url {
                Some(url) => {
                    let redis = Arc::new(redis::Client::open(url.as_str())?);
                    tracing::info!("Using Redis for throttle and sessions");
                    (
                        Arc::new(RedisThrottle::new(redis.clone(), config.throttle_window()))
                            as Arc<dyn ThrottleStore>,
                        Arc::new(RedisSessionStore::new(redis, config.session_ttl()))
                            as Arc<dyn SessionStore>,
                    )
                }
                None => {
                    tracing::warn!("REDIS_URL not set, using in-memory throttle and sessions");
                    let throttle = Arc::new(MemoryThrottle::new(config.throttle_window()));
                    let sessions = Arc::new(MemorySessionStore::new(config.session_ttl()));
                    sweepers.0.push(throttle.spawn_sweeper(config.throttle_sweep_interval()));
                    sweepers.0.push(sessions.spawn_sweeper(config.throttle_sweep_interval()));
                    (throttle as Arc<dyn ThrottleStore>, sessions as Arc<dyn SessionStore>)
                }
            };

        let state = Self {
            github: GithubClient::new(&config),
            config: Arc::new(config),
            posts,
            users,
            throttle,
            sessions,
        };
        Ok((state, sweepers))
    }
}
