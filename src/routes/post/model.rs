use serde_json::Value;

use crate::AppState;
use crate::cache::ThrottleAction;
use crate::cache::keys::throttle_key;
use crate::database::models::{Counter, Post, PostColumn};
use crate::database::query::{ListParams, ListQuery, project};
use crate::error::AppError;

/// 点赞或点踩
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    fn action(self) -> ThrottleAction {
        match self {
            Reaction::Like => ThrottleAction::Like,
            Reaction::Dislike => ThrottleAction::Dislike,
        }
    }

    fn counter(self) -> Counter {
        match self {
            Reaction::Like => Counter::Likes,
            Reaction::Dislike => Counter::Dislikes,
        }
    }

    /// 同一来源 24 小时内重复操作时返回的错误
    fn repeated(self) -> AppError {
        match self {
            Reaction::Like => AppError::LikeMoreTimes,
            Reaction::Dislike => AppError::DislikeMoreTimes,
        }
    }
}

/// 读取文章，同一来源每个窗口期只计一次浏览
pub async fn view(state: &AppState, id: i64, client_ip: &str) -> Result<Post, AppError> {
    let mut post = state.posts.find_by_id(id).await?;

    let key = throttle_key(ThrottleAction::View, id, client_ip);
    match state.throttle.check_and_mark(&key).await {
        Ok(true) => post = state.posts.increment(id, Counter::Visit).await?,
        Ok(false) => tracing::debug!("View already counted: {}", key),
        // 节流存储不可用时不影响读取，只是不计数
        Err(e) => tracing::warn!("Failed to check view throttle: {}", e),
    }

    post.comments_count = match state.posts.comments_count(&post.comment_topic()).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Failed to count comments for post {}: {}", id, e);
            0
        }
    };
    Ok(post)
}

/// 点赞或点踩，文章不存在时不占用窗口
pub async fn react(
    state: &AppState,
    id: i64,
    client_ip: &str,
    reaction: Reaction,
) -> Result<Post, AppError> {
    state.posts.find_by_id(id).await?;

    let key = throttle_key(reaction.action(), id, client_ip);
    if !state.throttle.check_and_mark(&key).await? {
        tracing::debug!("Reaction already counted: {}", key);
        return Err(reaction.repeated());
    }

    state.posts.increment(id, reaction.counter()).await
}

/// 列表查询，参数先校验，失败时不会访问存储
pub async fn list(state: &AppState, params: &ListParams) -> Result<Vec<Value>, AppError> {
    let query = ListQuery::<PostColumn>::from_params(params)?;
    let posts = state.posts.list(&query).await?;
    project(posts, &query.fields)
}
