/// 数据库实体定义
pub mod post;
pub mod user;

pub use post::{Counter, NewPost, Post, PostColumn, PostPatch};
pub use user::{NewUser, USER_TYPE_GITHUB, USER_TYPE_LOCAL, User, UserColumn, UserPatch, UserRecord};
