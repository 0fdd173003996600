//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::ai::{Draft, Tone};
use crate::application::reactions::ReactionOutput;
use crate::domain::entity::{comment::BlogComment, post::BlogPost, reaction::ReactionKind};
use crate::domain::listing::{BlogPage, SortOrder};

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Query string of `GET /api/blogs`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsParams {
    pub page: Option<u64>,
    #[serde(alias = "limit")]
    pub page_size: Option<u64>,
    /// Comma-separated, matches any
    pub tags: Option<String>,
    #[serde(alias = "author")]
    pub author_id: Option<String>,
    #[serde(alias = "q")]
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub tags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comment_count: u64,
    pub popularity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&BlogPost> for PostResponse {
    fn from(post: &BlogPost) -> Self {
        Self {
            id: post.blog_id.to_string(),
            title: post.title.as_str().to_string(),
            content: post.content.as_str().to_string(),
            author_id: post.author_id.to_string(),
            author_name: post.author_name.clone(),
            tags: post.tags.as_slice().to_vec(),
            views: post.engagement.views,
            likes: post.engagement.likes,
            dislikes: post.engagement.dislikes,
            comment_count: post.engagement.comments,
            popularity: post.popularity(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub items: Vec<PostResponse>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl From<&BlogPage> for PostListResponse {
    fn from(page: &BlogPage) -> Self {
        Self {
            items: page.items.iter().map(PostResponse::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub blog_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&BlogComment> for CommentResponse {
    fn from(comment: &BlogComment) -> Self {
        Self {
            id: comment.comment_id.to_string(),
            blog_id: comment.blog_id.to_string(),
            author_id: comment.author_id.to_string(),
            author_name: comment.author_name.clone(),
            content: comment.content.as_str().to_string(),
            created_at: comment.created_at,
        }
    }
}

// ============================================================================
// Reactions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    #[serde(alias = "type", alias = "kind")]
    pub reaction: ReactionKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub blog_id: String,
    pub reaction: Option<ReactionKind>,
    pub likes: u64,
    pub dislikes: u64,
    pub popularity: i64,
}

impl From<&ReactionOutput> for ReactionResponse {
    fn from(output: &ReactionOutput) -> Self {
        Self {
            blog_id: output.post.blog_id.to_string(),
            reaction: output.reaction,
            likes: output.post.engagement.likes,
            dislikes: output.post.engagement.dislikes,
            popularity: output.post.popularity(),
        }
    }
}

// ============================================================================
// AI
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tone: Tone,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImproveRequest {
    pub title: Option<String>,
    pub content: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub title: String,
    pub content: String,
}

impl From<Draft> for DraftResponse {
    fn from(draft: Draft) -> Self {
        Self {
            title: draft.title,
            content: draft.content,
        }
    }
}
