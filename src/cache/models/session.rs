use serde::{Deserialize, Serialize};

/// 会话中保存的用户信息
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionUser {
    pub user_id: i64,
    pub name: String,
    pub is_admin: bool,
}

/// 会话缓存数据模型
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CachedSession {
    pub session_id: String,
    pub user: SessionUser,
    pub created_at: i64, // Unix timestamp
    pub expires_at: i64, // Unix timestamp
}

impl CachedSession {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}
