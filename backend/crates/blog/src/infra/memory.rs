//! In-memory repository
//!
//! Same contracts as the MongoDB implementation. Clones share state.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::{BlogId, CommentId, UserId};
use tokio::sync::RwLock;

use crate::domain::entity::{
    comment::BlogComment,
    post::{BlogPost, EngagementDelta},
    reaction::BlogReaction,
};
use crate::domain::listing::{ListQuery, SortOrder};
use crate::domain::repository::{CommentRepository, PostRepository, ReactionRepository};
use crate::error::BlogResult;

#[derive(Debug, Default)]
struct State {
    posts: HashMap<BlogId, BlogPost>,
    comments: HashMap<CommentId, BlogComment>,
    reactions: HashMap<(BlogId, UserId), BlogReaction>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryBlogRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryBlogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn comment_count(&self) -> usize {
        self.state.read().await.comments.len()
    }

    pub async fn reaction_count(&self) -> usize {
        self.state.read().await.reactions.len()
    }
}

fn sort_posts(posts: &mut [BlogPost], sort: SortOrder) {
    match sort {
        SortOrder::Newest => posts.sort_by_key(|p| Reverse(p.created_at)),
        SortOrder::Oldest => posts.sort_by_key(|p| p.created_at),
        SortOrder::Popular => {
            posts.sort_by_key(|p| (Reverse(p.popularity()), Reverse(p.created_at)))
        }
        SortOrder::Views => {
            posts.sort_by_key(|p| (Reverse(p.engagement.views), Reverse(p.created_at)))
        }
        SortOrder::Likes => {
            posts.sort_by_key(|p| (Reverse(p.engagement.likes), Reverse(p.created_at)))
        }
    }
}

impl PostRepository for InMemoryBlogRepository {
    async fn insert_post(&self, post: &BlogPost) -> BlogResult<()> {
        self.state
            .write()
            .await
            .posts
            .insert(post.blog_id, post.clone());
        Ok(())
    }

    async fn find_post(&self, blog_id: &BlogId) -> BlogResult<Option<BlogPost>> {
        Ok(self.state.read().await.posts.get(blog_id).cloned())
    }

    async fn update_post(&self, post: &BlogPost) -> BlogResult<()> {
        let mut state = self.state.write().await;
        if let Some(stored) = state.posts.get_mut(&post.blog_id) {
            stored.title = post.title.clone();
            stored.content = post.content.clone();
            stored.tags = post.tags.clone();
            stored.updated_at = post.updated_at;
        }
        Ok(())
    }

    async fn delete_post(&self, blog_id: &BlogId) -> BlogResult<bool> {
        Ok(self.state.write().await.posts.remove(blog_id).is_some())
    }

    async fn list_posts(&self, query: &ListQuery) -> BlogResult<(Vec<BlogPost>, u64)> {
        let state = self.state.read().await;
        let mut matching: Vec<BlogPost> = state
            .posts
            .values()
            .filter(|post| query.filter.matches(post))
            .cloned()
            .collect();
        drop(state);

        sort_posts(&mut matching, query.sort);
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.skip()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.page_size).unwrap_or(usize::MAX))
            .collect();

        Ok((page, total))
    }

    async fn adjust_engagement(
        &self,
        blog_id: &BlogId,
        delta: EngagementDelta,
    ) -> BlogResult<Option<BlogPost>> {
        let mut state = self.state.write().await;
        Ok(state.posts.get_mut(blog_id).map(|post| {
            post.engagement.apply(delta);
            post.clone()
        }))
    }
}

impl CommentRepository for InMemoryBlogRepository {
    async fn insert_comment(&self, comment: &BlogComment) -> BlogResult<()> {
        self.state
            .write()
            .await
            .comments
            .insert(comment.comment_id, comment.clone());
        Ok(())
    }

    async fn find_comment(&self, comment_id: &CommentId) -> BlogResult<Option<BlogComment>> {
        Ok(self.state.read().await.comments.get(comment_id).cloned())
    }

    async fn list_comments(&self, blog_id: &BlogId) -> BlogResult<Vec<BlogComment>> {
        let mut comments: Vec<BlogComment> = self
            .state
            .read()
            .await
            .comments
            .values()
            .filter(|c| &c.blog_id == blog_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> BlogResult<bool> {
        Ok(self.state.write().await.comments.remove(comment_id).is_some())
    }

    async fn delete_comments_for(&self, blog_id: &BlogId) -> BlogResult<u64> {
        let mut state = self.state.write().await;
        let before = state.comments.len();
        state.comments.retain(|_, c| &c.blog_id != blog_id);
        Ok((before - state.comments.len()) as u64)
    }
}

impl ReactionRepository for InMemoryBlogRepository {
    async fn find_reaction(
        &self,
        blog_id: &BlogId,
        user_id: &UserId,
    ) -> BlogResult<Option<BlogReaction>> {
        Ok(self
            .state
            .read()
            .await
            .reactions
            .get(&(*blog_id, *user_id))
            .cloned())
    }

    async fn upsert_reaction(&self, reaction: &BlogReaction) -> BlogResult<()> {
        self.state
            .write()
            .await
            .reactions
            .insert((reaction.blog_id, reaction.user_id), reaction.clone());
        Ok(())
    }

    async fn delete_reaction(&self, blog_id: &BlogId, user_id: &UserId) -> BlogResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .reactions
            .remove(&(*blog_id, *user_id))
            .is_some())
    }

    async fn delete_reactions_for(&self, blog_id: &BlogId) -> BlogResult<u64> {
        let mut state = self.state.write().await;
        let before = state.reactions.len();
        state.reactions.retain(|(blog, _), _| blog != blog_id);
        Ok((before - state.reactions.len()) as u64)
    }
}
