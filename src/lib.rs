use std::sync::Arc;

use cache::{SessionStore, ThrottleStore};
use config::Config;
use database::{PostRepository, UserRepository};
use oauth::GithubClient;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod result;
pub mod router;
pub mod routes;
pub mod state;
pub mod utils;

pub use error::AppError;
pub use result::{ApiResult, ResultStatus};

/// 应用状态，所有存储在启动时构造后注入
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub throttle: Arc<dyn ThrottleStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub github: GithubClient,
}
