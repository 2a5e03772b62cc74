mod auth;

pub use auth::{CurrentUser, session_token};
