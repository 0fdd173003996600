//! Comment Use Cases

use std::sync::Arc;

use kernel::id::{BlogId, CommentId};

use crate::domain::entity::comment::BlogComment;
use crate::domain::entity::post::{Actor, EngagementDelta};
use crate::domain::repository::{CommentRepository, PostRepository};
use crate::domain::value_object::post_content::CommentText;
use crate::error::{BlogError, BlogResult};

pub struct CommentUseCase<P, C>
where
    P: PostRepository,
    C: CommentRepository,
{
    post_repo: Arc<P>,
    comment_repo: Arc<C>,
}

impl<P, C> CommentUseCase<P, C>
where
    P: PostRepository,
    C: CommentRepository,
{
    pub fn new(post_repo: Arc<P>, comment_repo: Arc<C>) -> Self {
        Self {
            post_repo,
            comment_repo,
        }
    }

    async fn ensure_post(&self, blog_id: &BlogId) -> BlogResult<()> {
        match self.post_repo.find_post(blog_id).await? {
            Some(_) => Ok(()),
            None => Err(BlogError::PostNotFound),
        }
    }

    pub async fn list(&self, blog_id: &BlogId) -> BlogResult<Vec<BlogComment>> {
        self.ensure_post(blog_id).await?;
        self.comment_repo.list_comments(blog_id).await
    }

    pub async fn add(
        &self,
        actor: &Actor,
        blog_id: &BlogId,
        content: String,
    ) -> BlogResult<BlogComment> {
        let content = CommentText::new(content)?;
        self.ensure_post(blog_id).await?;

        let comment = BlogComment::new(*blog_id, actor, content);
        self.comment_repo.insert_comment(&comment).await?;
        self.post_repo
            .adjust_engagement(blog_id, EngagementDelta::comment_added())
            .await?;

        tracing::info!(
            blog_id = %blog_id,
            comment_id = %comment.comment_id,
            author_id = %actor.user_id,
            "Comment added"
        );
        Ok(comment)
    }

    /// Comment authors and admins may delete
    pub async fn delete(
        &self,
        actor: &Actor,
        blog_id: &BlogId,
        comment_id: &CommentId,
    ) -> BlogResult<()> {
        let comment = self
            .comment_repo
            .find_comment(comment_id)
            .await?
            .filter(|c| &c.blog_id == blog_id)
            .ok_or(BlogError::CommentNotFound)?;

        if !actor.can_modify(&comment.author_id) {
            return Err(BlogError::NotAuthor("comment"));
        }

        if self.comment_repo.delete_comment(comment_id).await? {
            self.post_repo
                .adjust_engagement(blog_id, EngagementDelta::comment_removed())
                .await?;
        }

        tracing::info!(
            blog_id = %blog_id,
            comment_id = %comment_id,
            deleted_by = %actor.user_id,
            "Comment deleted"
        );
        Ok(())
    }
}
