use chrono::{DateTime, Utc};
use crate::helper::sanitization_helpers::{serialize_escaped, serialize_escaped_body};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    #[serde(serialize_with = "serialize_escaped")]
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Tag {
    pub id: i64,
    #[serde(serialize_with = "serialize_escaped")]
    pub name: String,
    pub slug: String,
}

/// A category row annotated with the number of *public* posts filed under it.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub num_posts: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub num_posts: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    #[serde(serialize_with = "serialize_escaped")]
    pub title: String,
    #[serde(serialize_with = "serialize_escaped_body")]
    pub content: String,
    pub is_public: bool,
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ContentImage {
    pub id: i64,
    pub post_id: i64,
    pub file_path: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    #[serde(serialize_with = "serialize_escaped")]
    pub name: String,
    #[serde(serialize_with = "serialize_escaped_body")]
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Reply {
    pub id: i64,
    pub comment_id: i64,
    #[serde(serialize_with = "serialize_escaped")]
    pub name: String,
    #[serde(serialize_with = "serialize_escaped_body")]
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub approved: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Reply>,
}

/// Everything the detail page of a post shows.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub images: Vec<ContentImage>,
    pub comments: Vec<CommentThread>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CategoryPosts {
    pub category: Category,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TagPosts {
    pub tag: Tag,
    pub posts: Vec<Post>,
}

/// One page of a listing. `number` is 1-based.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct Moderator {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_time: Option<DateTime<Utc>>,
}

/// What a moderation action or a submission acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Comment(i64),
    Reply(i64),
}

impl Feedback {
    pub fn id(&self) -> i64 {
        match self {
            Feedback::Comment(id) | Feedback::Reply(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Feedback::Comment(_) => "comment",
            Feedback::Reply(_) => "reply",
        }
    }
}

pub mod db_operations;
