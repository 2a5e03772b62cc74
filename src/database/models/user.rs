use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query::{Column, ColumnKind};

pub const USER_TYPE_LOCAL: i32 = 0;
pub const USER_TYPE_GITHUB: i32 = 1;

/// 用户数据库实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub nick: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub email: String,
    pub avatar_url: String,
    pub user_type: i32,
    /// 第三方登录的外部标识，形如 `github-1234`
    pub foreign_id: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    /// 登录成功后附带的会话令牌
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub token: Option<String>,
}

/// 创建用户请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub name: String,
    pub nick: String,
    pub password: String,
    pub email: String,
    pub avatar_url: String,
}

/// 写入存储的新用户，密码已经哈希
#[derive(Debug, Clone, Default)]
pub struct UserRecord {
    pub name: String,
    pub nick: String,
    pub password_hash: Option<String>,
    pub email: String,
    pub avatar_url: String,
    pub user_type: i32,
    pub foreign_id: Option<String>,
    pub is_admin: bool,
}

/// 修改用户请求，未给出的字段保持不变
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub nick: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// 列表查询允许使用的用户字段，密码不在其中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Id,
    Name,
    Nick,
    Email,
    AvatarUrl,
    UserType,
    ForeignId,
    IsAdmin,
    CreatedAt,
}

impl Column for UserColumn {
    const ALL: &'static [Self] = &[
        UserColumn::Id,
        UserColumn::Name,
        UserColumn::Nick,
        UserColumn::Email,
        UserColumn::AvatarUrl,
        UserColumn::UserType,
        UserColumn::ForeignId,
        UserColumn::IsAdmin,
        UserColumn::CreatedAt,
    ];

    fn name(self) -> &'static str {
        match self {
            UserColumn::Id => "id",
            UserColumn::Name => "name",
            UserColumn::Nick => "nick",
            UserColumn::Email => "email",
            UserColumn::AvatarUrl => "avatar_url",
            UserColumn::UserType => "user_type",
            UserColumn::ForeignId => "foreign_id",
            UserColumn::IsAdmin => "is_admin",
            UserColumn::CreatedAt => "created_at",
        }
    }

    fn kind(self) -> ColumnKind {
        match self {
            UserColumn::Id | UserColumn::UserType => ColumnKind::Int,
            UserColumn::IsAdmin => ColumnKind::Bool,
            UserColumn::CreatedAt => ColumnKind::Timestamp,
            _ => ColumnKind::Text,
        }
    }
}
