use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::cache::SessionUser;
use crate::error::AppError;

/// 已登录的用户，未登录时以 `NeedLogin` 拒绝
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session_id: String,
    pub user: SessionUser,
}

/// 从 Cookie 或 `Authorization: Bearer` 中读取会话令牌
pub fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(session_id) = session_token(parts, &state.config.session_cookie_name) else {
            return Err(AppError::NeedLogin);
        };

        match state.sessions.get(&session_id).await? {
            Some(session) => Ok(CurrentUser {
                session_id,
                user: session.user,
            }),
            None => {
                tracing::debug!("Session not found or expired");
                Err(AppError::NeedLogin)
            }
        }
    }
}
