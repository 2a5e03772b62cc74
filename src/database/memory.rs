use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::database::models::{
    Counter, NewPost, Post, PostColumn, PostPatch, User, UserColumn, UserPatch, UserRecord,
};
use crate::database::query::{Column, ListQuery};
use crate::database::repositories::{PostRepository, UserRepository};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    posts: BTreeMap<i64, Post>,
    users: BTreeMap<i64, User>,
    comments: HashMap<String, i64>,
    next_post_id: i64,
    next_user_id: i64,
}

/// 进程内存储
///
/// 未配置数据库时使用，语义与 PostgreSQL 实现保持一致：缺失记录返回 `NotFound`，
/// 用户名和外部标识唯一。
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条评论，评论数按主题统计
    pub fn add_comment(&self, topic: &str) {
        *self.tables.write().comments.entry(topic.to_string()).or_insert(0) += 1;
    }
}

fn select<'a, T, C, I>(rows: I, query: &ListQuery<C>) -> Result<Vec<T>, AppError>
where
    T: Serialize + Clone + 'a,
    C: Column,
    I: Iterator<Item = &'a T>,
{
    let rows: Vec<T> = rows.cloned().collect();
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // 过滤排序针对序列化后的值，再按 id 取回原记录
    let mut by_id: HashMap<i64, T> = values
        .iter()
        .zip(rows)
        .filter_map(|(value, row)| value["id"].as_i64().map(|id| (id, row)))
        .collect();
    Ok(query
        .apply(values)
        .iter()
        .filter_map(|value| value["id"].as_i64().and_then(|id| by_id.remove(&id)))
        .collect())
}

fn duplicate(constraint: &str) -> AppError {
    AppError::Duplicate(format!(
        "duplicate key value violates unique constraint \"{}\"",
        constraint
    ))
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, AppError> {
        let mut tables = self.tables.write();
        tables.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: tables.next_post_id,
            title: post.title,
            summary: post.summary,
            content: post.content,
            author: post.author,
            category: post.category,
            tags: post.tags,
            cover_url: post.cover_url,
            status: post.status,
            post_type: post.post_type,
            visit: 0,
            likes: 0,
            dislikes: 0,
            comments_count: 0,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, AppError> {
        self.tables.read().posts.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn list(&self, query: &ListQuery<PostColumn>) -> Result<Vec<Post>, AppError> {
        let tables = self.tables.read();
        select(tables.posts.values(), query)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.tables.read().posts.len() as i64)
    }

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Post, AppError> {
        let mut tables = self.tables.write();
        let post = tables.posts.get_mut(&id).ok_or(AppError::NotFound)?;
        patch.apply(post);
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.tables
            .write()
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }

    async fn increment(&self, id: i64, counter: Counter) -> Result<Post, AppError> {
        let mut tables = self.tables.write();
        let post = tables.posts.get_mut(&id).ok_or(AppError::NotFound)?;
        match counter {
            Counter::Visit => post.visit += 1,
            Counter::Likes => post.likes += 1,
            Counter::Dislikes => post.dislikes += 1,
        }
        Ok(post.clone())
    }

    async fn comments_count(&self, topic: &str) -> Result<i64, AppError> {
        Ok(self.tables.read().comments.get(topic).copied().unwrap_or(0))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: UserRecord) -> Result<User, AppError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.name == user.name) {
            return Err(duplicate("users_name_key"));
        }
        if user.foreign_id.is_some()
            && tables.users.values().any(|u| u.foreign_id == user.foreign_id)
        {
            return Err(duplicate("users_foreign_id_key"));
        }

        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            name: user.name,
            nick: user.nick,
            password_hash: user.password_hash,
            email: user.email,
            avatar_url: user.avatar_url,
            user_type: user.user_type,
            foreign_id: user.foreign_id,
            is_admin: user.is_admin,
            created_at: Utc::now(),
            token: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, AppError> {
        self.tables.read().users.get(&id).cloned().ok_or(AppError::NotFound)
    }

    async fn find_by_name(&self, name: &str) -> Result<User, AppError> {
        let tables = self.tables.read();
        tables
            .users
            .values()
            .find(|u| u.name == name)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        let tables = self.tables.read();
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn find_by_foreign_id(&self, foreign_id: &str) -> Result<User, AppError> {
        let tables = self.tables.read();
        tables
            .users
            .values()
            .find(|u| u.foreign_id.as_deref() == Some(foreign_id))
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn list(&self, query: &ListQuery<UserColumn>) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read();
        select(tables.users.values(), query)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<User, AppError> {
        let mut tables = self.tables.write();
        if let Some(name) = &patch.name {
            if tables.users.values().any(|u| u.id != id && &u.name == name) {
                return Err(duplicate("users_name_key"));
            }
        }

        let user = tables.users.get_mut(&id).ok_or(AppError::NotFound)?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(nick) = patch.nick {
            user.nick = nick;
        }
        if let Some(password) = patch.password {
            user.password_hash = Some(password);
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(avatar_url) = patch.avatar_url {
            user.avatar_url = avatar_url;
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.tables
            .write()
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::query::ListParams;

    fn new_post(title: &str, status: i32, post_type: i32) -> NewPost {
        NewPost {
            title: title.into(),
            status,
            post_type,
            ..NewPost::default()
        }
    }

    #[tokio::test]
    async fn post_crud_round_trip() {
        let store = MemoryStore::new();
        let post = PostRepository::create(&store, new_post("first", 1, 2)).await.unwrap();
        assert_eq!(post.id, 1);

        let patch = PostPatch {
            title: Some("renamed".into()),
            ..PostPatch::default()
        };
        let updated = PostRepository::update(&store, post.id, patch).await.unwrap();
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.status, 1);

        PostRepository::delete(&store, post.id).await.unwrap();
        let err = PostRepository::find_by_id(&store, post.id).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(PostRepository::delete(&store, post.id).await.is_err());
    }

    #[tokio::test]
    async fn list_applies_typed_filters() {
        let store = MemoryStore::new();
        PostRepository::create(&store, new_post("a", 1, 2)).await.unwrap();
        PostRepository::create(&store, new_post("b", 1, 3)).await.unwrap();
        PostRepository::create(&store, new_post("c", 1, 2)).await.unwrap();

        let params = ListParams {
            query: Some("status:1,type:2".into()),
            sortby: Some("id".into()),
            order: Some("desc".into()),
            ..ListParams::default()
        };
        let query = ListQuery::from_params(&params).unwrap();
        let titles: Vec<String> = PostRepository::list(&store, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["c", "a"]);
    }

    #[tokio::test]
    async fn counters_and_comments() {
        let store = MemoryStore::new();
        let post = PostRepository::create(&store, new_post("a", 0, 0)).await.unwrap();
        store.increment(post.id, Counter::Likes).await.unwrap();
        let post = store.increment(post.id, Counter::Likes).await.unwrap();
        assert_eq!(post.likes, 2);
        assert!(store.increment(99, Counter::Visit).await.unwrap_err().is_not_found());

        store.add_comment(&post.comment_topic());
        assert_eq!(store.comments_count("post-1").await.unwrap(), 1);
        assert_eq!(store.comments_count("post-2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn user_names_are_unique() {
        let store = MemoryStore::new();
        let record = UserRecord {
            name: "alice".into(),
            ..UserRecord::default()
        };
        UserRepository::create(&store, record.clone()).await.unwrap();
        let err = UserRepository::create(&store, record).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }
}
