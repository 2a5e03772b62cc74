use axum::{
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::Value;

use super::model::{self, GithubLoginRequest, LoginRequest};
use crate::{
    AppState,
    database::{
        ListParams,
        models::{NewUser, User, UserPatch},
    },
    error::AppError,
    middleware::CurrentUser,
    result::ApiResult,
    routes::{reply, reply_empty},
};

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.config.session_cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// 登录成功时写入会话 Cookie
fn with_session(state: &AppState, jar: CookieJar, result: Result<User, AppError>) -> (CookieJar, ApiResult<User>) {
    let jar = match &result {
        Ok(User { token: Some(token), .. }) => jar.add(session_cookie(state, token.clone())),
        _ => jar,
    };
    (jar, reply(result))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> impl IntoResponse {
    let result = match body {
        Ok(Json(req)) => model::register(&state, req).await.map(|_| ()),
        Err(e) => Err(e.into()),
    };

    let status = if result.is_ok() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, reply_empty(result))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<User> {
    let result = match id {
        Ok(Path(id)) => state.users.find_by_id(id).await,
        Err(e) => Err(e.into()),
    };
    reply(result)
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Value>> {
    let result = match params {
        Ok(Query(params)) => model::list(&state, &params).await,
        Err(e) => Err(e.into()),
    };
    reply(result)
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> ApiResult<()> {
    let result = match (id, body) {
        (Ok(Path(id)), Ok(Json(patch))) => model::update(&state, id, patch).await.map(|_| ()),
        (Err(e), _) => Err(e.into()),
        (_, Err(e)) => Err(e.into()),
    };
    reply_empty(result)
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let result = match id {
        Ok(Path(id)) => state.users.delete(id).await,
        Err(e) => Err(AppError::from(e)),
    };
    reply_empty(result)
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> (CookieJar, ApiResult<User>) {
    let result = match body {
        Ok(Json(req)) => match model::authenticate(&state, &req).await {
            Ok(user) => model::start_session(&state, user).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e.into()),
    };
    with_session(&state, jar, result)
}

#[axum::debug_handler]
pub async fn login_with_github(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<GithubLoginRequest>, JsonRejection>,
) -> (CookieJar, ApiResult<User>) {
    let result = match body {
        Ok(Json(req)) => match model::github_user(&state, &req).await {
            Ok(user) => model::start_session(&state, user).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e.into()),
    };
    with_session(&state, jar, result)
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    current: CurrentUser,
) -> (CookieJar, ApiResult<()>) {
    let result = state.sessions.remove(&current.session_id).await;
    let jar = jar.remove(Cookie::build(state.config.session_cookie_name.clone()).path("/"));
    (jar, reply_empty(result))
}
