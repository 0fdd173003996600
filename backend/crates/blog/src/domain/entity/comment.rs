//! Comment entity

use chrono::{DateTime, Utc};
use kernel::id::{BlogId, CommentId, UserId};

use crate::domain::entity::post::Actor;
use crate::domain::value_object::post_content::CommentText;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogComment {
    pub comment_id: CommentId,
    pub blog_id: BlogId,
    pub author_id: UserId,
    pub author_name: String,
    pub content: CommentText,
    pub created_at: DateTime<Utc>,
}

impl BlogComment {
    pub fn new(blog_id: BlogId, author: &Actor, content: CommentText) -> Self {
        Self {
            comment_id: CommentId::new(),
            blog_id,
            author_id: author.user_id,
            author_name: author.username.clone(),
            content,
            created_at: Utc::now(),
        }
    }
}
