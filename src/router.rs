use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{AppState, routes};

// 文章相关的路由
pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/post",
            post(routes::post::create_post).get(routes::post::list_posts),
        )
        .route("/post/count", get(routes::post::count_posts))
        .route("/post/like/{id}", get(routes::post::like_post))
        .route("/post/dislike/{id}", get(routes::post::dislike_post))
        .route(
            "/post/{id}",
            get(routes::post::get_post)
                .put(routes::post::update_post)
                .delete(routes::post::delete_post),
        )
}

// 用户相关的路由，登录状态由各处理器的提取器检查
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/user",
            post(routes::user::create_user).get(routes::user::list_users),
        )
        .route("/user/login", post(routes::user::login))
        .route("/user/loginWithGithub", post(routes::user::login_with_github))
        .route("/user/logout", post(routes::user::logout))
        .route(
            "/user/{id}",
            get(routes::user::get_user)
                .put(routes::user::update_user)
                .delete(routes::user::delete_user),
        )
}

/// 创建主路由
pub fn create_router(state: AppState) -> Router {
    let api = Router::new().merge(post_routes()).merge(user_routes());

    // 空前缀不能 nest
    let base = state.config.api_base_uri.trim_matches('/');
    let router = if base.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{}", base), api)
    };

    let router = router.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // 开发模式允许所有来源
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
