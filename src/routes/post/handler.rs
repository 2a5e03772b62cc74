use axum::{
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use super::model::{self, Reaction};
use crate::{
    AppState,
    database::{
        ListParams,
        models::{NewPost, Post, PostPatch},
    },
    error::AppError,
    result::ApiResult,
    routes::{reply, reply_empty},
    utils::ClientIp,
};

#[axum::debug_handler]
pub async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<NewPost>, JsonRejection>,
) -> impl IntoResponse {
    let result = match body {
        Ok(Json(post)) => state.posts.create(post).await.map(|_| ()),
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
pub async fn count_posts(State(state): State<AppState>) -> ApiResult<i64> {
    reply(state.posts.count().await)
}

#[axum::debug_handler]
pub async fn get_post(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Post> {
    let result = match id {
        Ok(Path(id)) => model::view(&state, id, &ip).await,
        Err(e) => Err(e.into()),
    };
    reply(result)
}

#[axum::debug_handler]
pub async fn list_posts(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Vec<Value>> {
    let result = match params {
        Ok(Query(params)) => model::list(&state, &params).await,
        Err(e) => Err(e.into()),
    };
    reply(result)
}

#[axum::debug_handler]
pub async fn update_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PostPatch>, JsonRejection>,
) -> ApiResult<()> {
    let result = match (id, body) {
        (Ok(Path(id)), Ok(Json(patch))) => state.posts.update(id, patch).await.map(|_| ()),
        (Err(e), _) => Err(e.into()),
        (_, Err(e)) => Err(e.into()),
    };
    reply_empty(result)
}

#[axum::debug_handler]
pub async fn delete_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    let result = match id {
        Ok(Path(id)) => state.posts.delete(id).await,
        Err(e) => Err(AppError::from(e)),
    };
    reply_empty(result)
}

#[axum::debug_handler]
pub async fn like_post(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Post> {
    let result = match id {
        Ok(Path(id)) => model::react(&state, id, &ip, Reaction::Like).await,
        Err(e) => Err(e.into()),
    };
    reply(result)
}

#[axum::debug_handler]
pub async fn dislike_post(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Post> {
    let result = match id {
        Ok(Path(id)) => model::react(&state, id, &ip, Reaction::Dislike).await,
        Err(e) => Err(e.into()),
    };
    reply(result)
}
