use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Serialize, Serializer};

use crate::error::AppError;

/// 响应状态码，序列化为整数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResultStatus {
    Success = 0,
    Unknown = 1,
    NeedLogin = 2,
    UserNotExist = 3,
    PasswordError = 4,
    LikeMoreTimes = 5,
    DislikeMoreTimes = 6,
}

impl Serialize for ResultStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// 统一响应信封，三个字段始终输出
#[derive(Debug, Serialize)]
pub struct ApiResult<T: Serialize> {
    pub status: ResultStatus,
    pub data: Option<T>,
    pub message: String,
}

impl<T: Serialize> ApiResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResultStatus::Success,
            data: Some(data),
            message: String::new(),
        }
    }

    /// 没有错误或者只是没有匹配的记录时视为成功，否则按映射表取状态码，数据照常携带
    pub fn from_outcome(data: Option<T>, err: Option<&AppError>) -> Self {
        match err {
            None | Some(AppError::NotFound) => Self {
                status: ResultStatus::Success,
                data,
                message: String::new(),
            },
            Some(err) => Self {
                status: err.status(),
                data,
                message: err.to_string(),
            },
        }
    }

    pub fn from_error(err: &AppError) -> Self {
        Self {
            status: err.status(),
            data: None,
            message: err.to_string(),
        }
    }
}

impl ApiResult<()> {
    /// 用于新增、修改、删除：成功时不带数据
    pub fn from_empty(result: Result<(), AppError>) -> Self {
        match result {
            Ok(()) => Self {
                status: ResultStatus::Success,
                data: None,
                message: String::new(),
            },
            Err(err) => Self::from_error(&err),
        }
    }
}

impl<T: Serialize> From<Result<T, AppError>> for ApiResult<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(err) => Self::from_outcome(None, Some(&err)),
        }
    }
}

// 错误只通过信封中的 status 传递，HTTP 状态码始终为 200
impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn mapped() -> Vec<(AppError, ResultStatus, &'static str)> {
        vec![
            (AppError::NeedLogin, ResultStatus::NeedLogin, "need login"),
            (AppError::UserNotExist, ResultStatus::UserNotExist, "user not exist"),
            (AppError::PasswordError, ResultStatus::PasswordError, "password error"),
            (AppError::LikeMoreTimes, ResultStatus::LikeMoreTimes, "like more times"),
            (
                AppError::DislikeMoreTimes,
                ResultStatus::DislikeMoreTimes,
                "dislike more times",
            ),
        ]
    }

    #[test]
    fn mapped_errors_carry_their_status_and_text() {
        for (err, status, text) in mapped() {
            let result = ApiResult::from_outcome(Some(7), Some(&err));
            assert_eq!(result.status, status);
            assert_eq!(result.message, text);
            assert_eq!(result.data, Some(7));

            let result = ApiResult::<i32>::from_error(&err);
            assert_eq!(result.status, status);
            assert_eq!(result.message, text);
            assert!(result.data.is_none());
        }
    }

    #[test]
    fn unmapped_errors_collapse_to_unknown() {
        let errors = [
            AppError::InvalidQuery("invalid query key/value pair".into()),
            AppError::Internal("boom".into()),
            AppError::OAuth("bad verification code".into()),
            AppError::Database(sqlx::Error::PoolTimedOut),
        ];
        for err in errors {
            let result = ApiResult::<()>::from_error(&err);
            assert_eq!(result.status, ResultStatus::Unknown);
            assert_eq!(result.message, err.to_string());
        }
    }

    #[test]
    fn missing_row_is_success() {
        let ok = ApiResult::from_outcome(Some("post"), None);
        let missing = ApiResult::from_outcome(Some("post"), Some(&AppError::NotFound));
        for result in [ok, missing] {
            assert_eq!(result.status, ResultStatus::Success);
            assert_eq!(result.data, Some("post"));
            assert!(result.message.is_empty());
        }

        // 作为单纯的错误时不属于映射表
        let result = ApiResult::<()>::from_error(&AppError::NotFound);
        assert_eq!(result.status, ResultStatus::Unknown);
    }

    #[test]
    fn sql_row_not_found_converts_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
        let result: ApiResult<i32> = Err(err).into();
        assert_eq!(result.status, ResultStatus::Success);
        assert!(result.data.is_none());
    }

    #[test]
    fn envelope_serializes_every_field() {
        let value = serde_json::to_value(ApiResult::<()>::from_empty(Ok(()))).unwrap();
        assert_eq!(value, json!({"status": 0, "data": null, "message": ""}));

        let value = serde_json::to_value(ApiResult::<()>::from_error(&AppError::NeedLogin)).unwrap();
        assert_eq!(value, json!({"status": 2, "data": null, "message": "need login"}));
    }
}
