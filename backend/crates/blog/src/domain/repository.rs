//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra`.

use kernel::id::{BlogId, CommentId, UserId};

use crate::domain::entity::{
    comment::BlogComment,
    post::{BlogPost, EngagementDelta},
    reaction::BlogReaction,
};
use crate::domain::listing::ListQuery;
use crate::error::BlogResult;

#[trait_variant::make(PostRepository: Send)]
pub trait LocalPostRepository {
    async fn insert_post(&self, post: &BlogPost) -> BlogResult<()>;

    async fn find_post(&self, blog_id: &BlogId) -> BlogResult<Option<BlogPost>>;

    /// Persist title, content, tags and `updated_at`. Counters are left alone.
    async fn update_post(&self, post: &BlogPost) -> BlogResult<()>;

    /// Returns false if nothing was deleted
    async fn delete_post(&self, blog_id: &BlogId) -> BlogResult<bool>;

    /// One page of matching posts and the total match count
    async fn list_posts(&self, query: &ListQuery) -> BlogResult<(Vec<BlogPost>, u64)>;

    /// Atomically shift counters and popularity; returns the updated post
    async fn adjust_engagement(
        &self,
        blog_id: &BlogId,
        delta: EngagementDelta,
    ) -> BlogResult<Option<BlogPost>>;
}

#[trait_variant::make(CommentRepository: Send)]
pub trait LocalCommentRepository {
    async fn insert_comment(&self, comment: &BlogComment) -> BlogResult<()>;

    async fn find_comment(&self, comment_id: &CommentId) -> BlogResult<Option<BlogComment>>;

    /// Oldest first
    async fn list_comments(&self, blog_id: &BlogId) -> BlogResult<Vec<BlogComment>>;

    async fn delete_comment(&self, comment_id: &CommentId) -> BlogResult<bool>;

    async fn delete_comments_for(&self, blog_id: &BlogId) -> BlogResult<u64>;
}

/// Keyed by (blog, user)
#[trait_variant::make(ReactionRepository: Send)]
pub trait LocalReactionRepository {
    async fn find_reaction(
        &self,
        blog_id: &BlogId,
        user_id: &UserId,
    ) -> BlogResult<Option<BlogReaction>>;

    /// Insert or overwrite the pair's reaction
    async fn upsert_reaction(&self, reaction: &BlogReaction) -> BlogResult<()>;

    async fn delete_reaction(&self, blog_id: &BlogId, user_id: &UserId) -> BlogResult<bool>;

    async fn delete_reactions_for(&self, blog_id: &BlogId) -> BlogResult<u64>;
}

/// Every repository the blog handlers need, behind one shared handle
pub trait BlogStore:
    PostRepository + CommentRepository + ReactionRepository + Clone + Send + Sync + 'static
{
}

impl<T> BlogStore for T where
    T: PostRepository + CommentRepository + ReactionRepository + Clone + Send + Sync + 'static
{
}
