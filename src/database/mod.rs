// 数据库模块
// 包含实体定义、列表查询规格和存储实现

pub mod memory;
pub mod models;
pub mod query;
pub mod repositories;

pub use memory::MemoryStore;
pub use models::{Post, User};
pub use query::{ListParams, ListQuery};
pub use repositories::{PgPostRepository, PgUserRepository, PostRepository, UserRepository};
