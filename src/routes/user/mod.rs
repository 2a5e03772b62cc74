mod handler;
mod model;

pub use handler::{
    create_user, delete_user, get_user, list_users, login, login_with_github, logout,
    update_user,
};
pub use model::{GithubLoginRequest, LoginRequest};
