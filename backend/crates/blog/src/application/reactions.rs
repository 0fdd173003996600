//! Reaction Use Case
//!
//! Like or dislike a post. Repeating the current reaction changes nothing;
//! switching moves the vote between counters.

use std::sync::Arc;

use kernel::id::{BlogId, UserId};

use crate::domain::entity::post::BlogPost;
use crate::domain::entity::reaction::{BlogReaction, ReactionKind};
use crate::domain::repository::{PostRepository, ReactionRepository};
use crate::error::{BlogError, BlogResult};

#[derive(Debug, Clone)]
pub struct ReactionOutput {
    pub post: BlogPost,
    /// The caller's reaction after the call
    pub reaction: Option<ReactionKind>,
}

pub struct ReactionUseCase<P, R>
where
    P: PostRepository,
    R: ReactionRepository,
{
    post_repo: Arc<P>,
    reaction_repo: Arc<R>,
}

impl<P, R> ReactionUseCase<P, R>
where
    P: PostRepository,
    R: ReactionRepository,
{
    pub fn new(post_repo: Arc<P>, reaction_repo: Arc<R>) -> Self {
        Self {
            post_repo,
            reaction_repo,
        }
    }

    pub async fn react(
        &self,
        user_id: &UserId,
        blog_id: &BlogId,
        kind: ReactionKind,
    ) -> BlogResult<ReactionOutput> {
        let post = self
            .post_repo
            .find_post(blog_id)
            .await?
            .ok_or(BlogError::PostNotFound)?;

        let existing = self.reaction_repo.find_reaction(blog_id, user_id).await?;
        let previous = existing.as_ref().map(|r| r.kind);

        if previous == Some(kind) {
            return Ok(ReactionOutput {
                post,
                reaction: Some(kind),
            });
        }

        let reaction = match existing {
            Some(mut reaction) => {
                reaction.switch_to(kind);
                reaction
            }
            None => BlogReaction::new(*blog_id, *user_id, kind),
        };
        self.reaction_repo.upsert_reaction(&reaction).await?;

        let post = self
            .post_repo
            .adjust_engagement(blog_id, ReactionKind::transition(previous, Some(kind)))
            .await?
            .ok_or(BlogError::PostNotFound)?;

        tracing::info!(
            blog_id = %blog_id,
            user_id = %user_id,
            reaction = %kind,
            "Reaction recorded"
        );
        Ok(ReactionOutput {
            post,
            reaction: Some(kind),
        })
    }

    pub async fn remove(&self, user_id: &UserId, blog_id: &BlogId) -> BlogResult<ReactionOutput> {
        let existing = self
            .reaction_repo
            .find_reaction(blog_id, user_id)
            .await?
            .ok_or(BlogError::ReactionNotFound)?;

        if !self.reaction_repo.delete_reaction(blog_id, user_id).await? {
            return Err(BlogError::ReactionNotFound);
        }

        let post = self
            .post_repo
            .adjust_engagement(blog_id, ReactionKind::transition(Some(existing.kind), None))
            .await?
            .ok_or(BlogError::PostNotFound)?;

        tracing::info!(blog_id = %blog_id, user_id = %user_id, "Reaction removed");
        Ok(ReactionOutput { post, reaction: None })
    }
}
