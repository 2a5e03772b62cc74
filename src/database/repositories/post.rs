use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{PostRepository, push_list_clauses};
use crate::database::models::{Counter, NewPost, Post, PostColumn, PostPatch};
use crate::database::query::ListQuery;
use crate::error::AppError;

const POST_COLUMNS: &str = r#"
    id, title, summary, content, author, category, tags, cover_url,
    status, "type", visit, likes, dislikes, created_at, updated_at
"#;

/// 文章存储的 PostgreSQL 实现
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, AppError> {
        let sql = format!(
            r#"
            INSERT INTO posts (
                title, summary, content, author, category, tags, cover_url, status, "type"
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(post.title)
            .bind(post.summary)
            .bind(post.content)
            .bind(post.author)
            .bind(post.category)
            .bind(post.tags)
            .bind(post.cover_url)
            .bind(post.status)
            .bind(post.post_type)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created post: {}", post.id);
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, AppError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        post.ok_or(AppError::NotFound)
    }

    async fn list(&self, query: &ListQuery<PostColumn>) -> Result<Vec<Post>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_list_clauses(&mut qb, query);

        let posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;
        Ok(posts)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update(&self, id: i64, patch: PostPatch) -> Result<Post, AppError> {
        let mut post = self.find_by_id(id).await?;
        patch.apply(&mut post);

        let sql = format!(
            r#"
            UPDATE posts
            SET title = $1, summary = $2, content = $3, author = $4, category = $5,
                tags = $6, cover_url = $7, status = $8, "type" = $9, updated_at = NOW()
            WHERE id = $10
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(post.title)
            .bind(post.summary)
            .bind(post.content)
            .bind(post.author)
            .bind(post.category)
            .bind(post.tags)
            .bind(post.cover_url)
            .bind(post.status)
            .bind(post.post_type)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(post)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn increment(&self, id: i64, counter: Counter) -> Result<Post, AppError> {
        // 列名来自枚举，加一在数据库内完成
        let sql = format!(
            "UPDATE posts SET {col} = {col} + 1 WHERE id = $1 RETURNING {}",
            POST_COLUMNS,
            col = counter.column()
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        post.ok_or(AppError::NotFound)
    }

    async fn comments_count(&self, topic: &str) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE topic = $1")
            .bind(topic)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
