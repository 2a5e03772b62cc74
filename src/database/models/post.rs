use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::database::query::{Column, ColumnKind};

/// 文章数据库实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub tags: String,
    pub cover_url: String,
    pub status: i32,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub post_type: i32,
    pub visit: i64,
    pub likes: i64,
    pub dislikes: i64,
    /// 评论数，查询时计算，不落库
    #[sqlx(skip)]
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// 评论按主题归属文章
    pub fn comment_topic(&self) -> String {
        format!("post-{}", self.id)
    }
}

/// 创建文章请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPost {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub tags: String,
    pub cover_url: String,
    pub status: i32,
    #[serde(rename = "type")]
    pub post_type: i32,
}

/// 修改文章请求，未给出的字段保持不变
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Option<String>,
    pub cover_url: Option<String>,
    pub status: Option<i32>,
    #[serde(rename = "type")]
    pub post_type: Option<i32>,
}

impl PostPatch {
    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(summary) = self.summary {
            post.summary = summary;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        if let Some(author) = self.author {
            post.author = author;
        }
        if let Some(category) = self.category {
            post.category = category;
        }
        if let Some(tags) = self.tags {
            post.tags = tags;
        }
        if let Some(cover_url) = self.cover_url {
            post.cover_url = cover_url;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if let Some(post_type) = self.post_type {
            post.post_type = post_type;
        }
    }
}

/// 可累加的计数字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Visit,
    Likes,
    Dislikes,
}

impl Counter {
    pub fn column(self) -> &'static str {
        match self {
            Counter::Visit => "visit",
            Counter::Likes => "likes",
            Counter::Dislikes => "dislikes",
        }
    }
}

/// 列表查询允许使用的文章字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostColumn {
    Id,
    Title,
    Summary,
    Content,
    Author,
    Category,
    Tags,
    CoverUrl,
    Status,
    Type,
    Visit,
    Likes,
    Dislikes,
    CreatedAt,
    UpdatedAt,
}

impl Column for PostColumn {
    const ALL: &'static [Self] = &[
        PostColumn::Id,
        PostColumn::Title,
        PostColumn::Summary,
        PostColumn::Content,
        PostColumn::Author,
        PostColumn::Category,
        PostColumn::Tags,
        PostColumn::CoverUrl,
        PostColumn::Status,
        PostColumn::Type,
        PostColumn::Visit,
        PostColumn::Likes,
        PostColumn::Dislikes,
        PostColumn::CreatedAt,
        PostColumn::UpdatedAt,
    ];

    fn name(self) -> &'static str {
        match self {
            PostColumn::Id => "id",
            PostColumn::Title => "title",
            PostColumn::Summary => "summary",
            PostColumn::Content => "content",
            PostColumn::Author => "author",
            PostColumn::Category => "category",
            PostColumn::Tags => "tags",
            PostColumn::CoverUrl => "cover_url",
            PostColumn::Status => "status",
            PostColumn::Type => "type",
            PostColumn::Visit => "visit",
            PostColumn::Likes => "likes",
            PostColumn::Dislikes => "dislikes",
            PostColumn::CreatedAt => "created_at",
            PostColumn::UpdatedAt => "updated_at",
        }
    }

    fn kind(self) -> ColumnKind {
        match self {
            PostColumn::Id
            | PostColumn::Status
            | PostColumn::Type
            | PostColumn::Visit
            | PostColumn::Likes
            | PostColumn::Dislikes => ColumnKind::Int,
            PostColumn::CreatedAt | PostColumn::UpdatedAt => ColumnKind::Timestamp,
            _ => ColumnKind::Text,
        }
    }
}
