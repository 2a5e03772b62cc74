use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{UserRepository, push_list_clauses};
use crate::database::models::{User, UserColumn, UserPatch, UserRecord};
use crate::database::query::ListQuery;
use crate::error::AppError;

const USER_COLUMNS: &str = r#"
    id, name, nick, password_hash, email, avatar_url, user_type,
    foreign_id, is_admin, created_at
"#;

/// 用户存储的 PostgreSQL 实现
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<User, AppError> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: UserRecord) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (
                name, nick, password_hash, email, avatar_url, user_type, foreign_id, is_admin
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let result = sqlx::query_as::<_, User>(&sql)
            .bind(user.name)
            .bind(user.nick)
            .bind(user.password_hash)
            .bind(user.email)
            .bind(user.avatar_url)
            .bind(user.user_type)
            .bind(user.foreign_id)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => {
                tracing::info!("Created user: {}", user.id);
                Ok(user)
            }
            Err(e) => {
                tracing::error!("Failed to create user: {:?}", e);
                Err(e.into())
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> Result<User, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or(AppError::NotFound)
    }

    async fn find_by_name(&self, name: &str) -> Result<User, AppError> {
        self.find_one("name", name).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, AppError> {
        self.find_one("email", email).await
    }

    async fn find_by_foreign_id(&self, foreign_id: &str) -> Result<User, AppError> {
        self.find_one("foreign_id", foreign_id).await
    }

    async fn list(&self, query: &ListQuery<UserColumn>) -> Result<Vec<User>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_list_clauses(&mut qb, query);

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn update(&self, id: i64, patch: UserPatch) -> Result<User, AppError> {
        let current = self.find_by_id(id).await?;

        let sql = format!(
            r#"
            UPDATE users
            SET name = $1, nick = $2, password_hash = $3, email = $4, avatar_url = $5
            WHERE id = $6
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(patch.name.unwrap_or(current.name))
            .bind(patch.nick.unwrap_or(current.nick))
            .bind(patch.password.or(current.password_hash))
            .bind(patch.email.unwrap_or(current.email))
            .bind(patch.avatar_url.unwrap_or(current.avatar_url))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
