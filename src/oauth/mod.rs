// 第三方登录
pub mod github;

pub use github::{GithubClient, GithubUser};
