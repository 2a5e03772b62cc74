// 缓存模块
// 节流记录和登录会话，均有进程内和 Redis 两种实现

pub mod keys;
pub mod models;
pub mod operations;

pub use models::session::{CachedSession, SessionUser};
pub use operations::session::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use operations::throttle::{MemoryThrottle, RedisThrottle, ThrottleAction, ThrottleStore};
