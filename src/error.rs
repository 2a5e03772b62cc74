use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::result::{ApiResult, ResultStatus};

/// 业务错误
///
/// 所有处理器和存储层都以此类型返回错误，最终统一映射到响应信封中的 `status`。
#[derive(Debug, Error)]
pub enum AppError {
    #[error("need login")]
    NeedLogin,
    #[error("user not exist")]
    UserNotExist,
    #[error("password error")]
    PasswordError,
    #[error("like more times")]
    LikeMoreTimes,
    #[error("dislike more times")]
    DislikeMoreTimes,
    /// 查询没有匹配的记录
    #[error("no row found")]
    NotFound,
    #[error("Error: {0}")]
    InvalidQuery(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Duplicate(String),
    #[error(transparent)]
    Database(sqlx::Error),
    #[error(transparent)]
    Cache(#[from] redis::RedisError),
    #[error("Error: {0}")]
    OAuth(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// 错误到状态码的映射表，未列出的错误一律为 `Unknown`
    pub fn status(&self) -> ResultStatus {
        match self {
            AppError::NeedLogin => ResultStatus::NeedLogin,
            AppError::UserNotExist => ResultStatus::UserNotExist,
            AppError::PasswordError => ResultStatus::PasswordError,
            AppError::LikeMoreTimes => ResultStatus::LikeMoreTimes,
            AppError::DislikeMoreTimes => ResultStatus::DislikeMoreTimes,
            AppError::NotFound
            | AppError::InvalidQuery(_)
            | AppError::InvalidRequest(_)
            | AppError::Duplicate(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::OAuth(_)
            | AppError::Internal(_) => ResultStatus::Unknown,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound)
    }
}

// `RowNotFound` 单独转换为 `NotFound`，唯一约束冲突转换为 `Duplicate`
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Duplicate(db.message().to_string())
            }
            other => AppError::Database(other),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Failed to hash password: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::OAuth(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResult::<()>::from_error(&self).into_response()
    }
}
