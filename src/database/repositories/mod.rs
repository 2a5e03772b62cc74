use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::database::models::{
    Counter, NewPost, Post, PostColumn, PostPatch, User, UserColumn, UserPatch, UserRecord,
};
use crate::database::query::{Column, FilterValue, ListQuery};
use crate::error::AppError;

mod post;
mod user;

pub use post::PgPostRepository;
pub use user::PgUserRepository;

/// 文章存储
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Post, AppError>;

    async fn list(&self, query: &ListQuery<PostColumn>) -> Result<Vec<Post>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Post, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// 计数字段原子加一，返回更新后的文章
    async fn increment(&self, id: i64, counter: Counter) -> Result<Post, AppError>;

    async fn comments_count(&self, topic: &str) -> Result<i64, AppError>;
}

/// 用户存储
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: UserRecord) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<User, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<User, AppError>;

    async fn find_by_foreign_id(&self, foreign_id: &str) -> Result<User, AppError>;

    async fn list(&self, query: &ListQuery<UserColumn>) -> Result<Vec<User>, AppError>;

    /// 密码字段需要调用方先完成哈希
    async fn update(&self, id: i64, patch: UserPatch) -> Result<User, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

/// 追加 WHERE、ORDER BY、LIMIT、OFFSET，列名只来自枚举
pub(crate) fn push_list_clauses<C: Column>(qb: &mut QueryBuilder<'_, Postgres>, query: &ListQuery<C>) {
    for (i, (column, value)) in query.filters.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(format!("\"{}\" = ", column.name()));
        match value {
            FilterValue::Int(v) => qb.push_bind(*v),
            FilterValue::Text(v) => qb.push_bind(v.clone()),
            FilterValue::Bool(v) => qb.push_bind(*v),
            FilterValue::Timestamp(v) => qb.push_bind(*v),
        };
    }

    qb.push(" ORDER BY ");
    for (column, dir) in &query.sort {
        qb.push(format!("\"{}\" {}, ", column.name(), dir.as_sql()));
    }
    qb.push("id ASC");

    qb.push(" LIMIT ").push_bind(query.limit);
    qb.push(" OFFSET ").push_bind(query.offset);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::query::ListParams;

    #[test]
    fn list_sql_quotes_enumerated_columns_and_binds_values() {
        let params = ListParams {
            query: Some("status:1,type:2".into()),
            sortby: Some("likes".into()),
            order: Some("desc".into()),
            ..ListParams::default()
        };
        let query = ListQuery::<PostColumn>::from_params(&params).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM posts");
        push_list_clauses(&mut qb, &query);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM posts WHERE \"status\" = $1 AND \"type\" = $2 \
             ORDER BY \"likes\" DESC, id ASC LIMIT $3 OFFSET $4"
        );
    }
}
