/// 缓存键模块
/// 提供各种缓存键生成函数
use crate::cache::operations::throttle::ThrottleAction;

/// Redis 中节流记录的前缀
const THROTTLE_PREFIX: &str = "throttle:";

/// Redis 中会话的前缀
const SESSION_PREFIX: &str = "session:";

/// 生成节流键，形如 `like-remote-ips-post-12-10.0.0.7`
pub fn throttle_key(action: ThrottleAction, resource_id: i64, identity: &str) -> String {
    format!("{}-{}-{}", action.prefix(), resource_id, identity)
}

pub fn redis_throttle_key(key: &str) -> String {
    format!("{}{}", THROTTLE_PREFIX, key)
}

pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_never_share_keys() {
        let view = throttle_key(ThrottleAction::View, 3, "1.2.3.4");
        let like = throttle_key(ThrottleAction::Like, 3, "1.2.3.4");
        let dislike = throttle_key(ThrottleAction::Dislike, 3, "1.2.3.4");
        assert_eq!(view, "remote-ips-post-3-1.2.3.4");
        assert_eq!(like, "like-remote-ips-post-3-1.2.3.4");
        assert_eq!(dislike, "dislike-remote-ips-post-3-1.2.3.4");
    }
}
