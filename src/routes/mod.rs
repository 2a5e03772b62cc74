use serde::Serialize;

use crate::error::AppError;
use crate::result::{ApiResult, ResultStatus};

pub mod post;
pub mod user;

fn log_failure(err: &AppError) {
    match err {
        AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) | AppError::OAuth(_) => {
            tracing::error!("Request failed: {}", err)
        }
        _ if err.status() == ResultStatus::Unknown => tracing::warn!("Request rejected: {}", err),
        _ => tracing::debug!("Request rejected: {}", err),
    }
}

/// 记录失败后转换为响应信封
pub(crate) fn reply<T: Serialize>(result: Result<T, AppError>) -> ApiResult<T> {
    if let Err(err) = &result {
        if !err.is_not_found() {
            log_failure(err);
        }
    }
    result.into()
}

/// 新增、修改、删除不返回数据
pub(crate) fn reply_empty(result: Result<(), AppError>) -> ApiResult<()> {
    if let Err(err) = &result {
        log_failure(err);
    }
    ApiResult::from_empty(result)
}
