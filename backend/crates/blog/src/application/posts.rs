//! Post Use Cases
//!
//! Create, read (counting a view), edit and delete posts.

use std::sync::Arc;

use kernel::id::BlogId;

use crate::domain::entity::post::{Actor, BlogPost, EngagementDelta};
use crate::domain::repository::{CommentRepository, PostRepository, ReactionRepository};
use crate::domain::value_object::{post_content::PostContent, tags::Tags, title::Title};
use crate::error::{BlogError, BlogResult};

pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Absent fields stay unchanged
#[derive(Default)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub struct CreatePostUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> CreatePostUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn execute(&self, author: &Actor, input: CreatePostInput) -> BlogResult<BlogPost> {
        let post = BlogPost::new(
            Title::new(input.title)?,
            PostContent::new(input.content)?,
            Tags::new(&input.tags)?,
            author,
        );

        self.post_repo.insert_post(&post).await?;

        tracing::info!(blog_id = %post.blog_id, author_id = %post.author_id, "Blog post created");
        Ok(post)
    }
}

/// Fetch a post and count the view
pub struct GetPostUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> GetPostUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn execute(&self, blog_id: &BlogId) -> BlogResult<BlogPost> {
        self.post_repo
            .adjust_engagement(blog_id, EngagementDelta::view())
            .await?
            .ok_or(BlogError::PostNotFound)
    }
}

pub struct UpdatePostUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
}

impl<P> UpdatePostUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>) -> Self {
        Self { post_repo }
    }

    pub async fn execute(
        &self,
        actor: &Actor,
        blog_id: &BlogId,
        input: UpdatePostInput,
    ) -> BlogResult<BlogPost> {
        let title = input.title.map(Title::new).transpose()?;
        let content = input.content.map(PostContent::new).transpose()?;
        let tags = input.tags.as_ref().map(Tags::new).transpose()?;

        let mut post = self
            .post_repo
            .find_post(blog_id)
            .await?
            .ok_or(BlogError::PostNotFound)?;

        if !actor.can_modify(&post.author_id) {
            return Err(BlogError::NotAuthor("post"));
        }

        post.edit(title, content, tags);
        self.post_repo.update_post(&post).await?;

        tracing::info!(blog_id = %post.blog_id, editor_id = %actor.user_id, "Blog post updated");
        Ok(post)
    }
}

/// Delete a post together with its comments and reactions
pub struct DeletePostUseCase<P, C, R>
where
    P: PostRepository,
    C: CommentRepository,
    R: ReactionRepository,
{
    post_repo: Arc<P>,
    comment_repo: Arc<C>,
    reaction_repo: Arc<R>,
}

impl<P, C, R> DeletePostUseCase<P, C, R>
where
    P: PostRepository,
    C: CommentRepository,
    R: ReactionRepository,
{
    pub fn new(post_repo: Arc<P>, comment_repo: Arc<C>, reaction_repo: Arc<R>) -> Self {
        Self {
            post_repo,
            comment_repo,
            reaction_repo,
        }
    }

    pub async fn execute(&self, actor: &Actor, blog_id: &BlogId) -> BlogResult<()> {
        let post = self
            .post_repo
            .find_post(blog_id)
            .await?
            .ok_or(BlogError::PostNotFound)?;

        if !actor.can_modify(&post.author_id) {
            return Err(BlogError::NotAuthor("post"));
        }

        // Children before the post
        let comments = self.comment_repo.delete_comments_for(blog_id).await?;
        let reactions = self.reaction_repo.delete_reactions_for(blog_id).await?;

        if !self.post_repo.delete_post(blog_id).await? {
            return Err(BlogError::PostNotFound);
        }

        tracing::info!(
            blog_id = %blog_id,
            deleted_by = %actor.user_id,
            comments,
            reactions,
            "Blog post deleted"
        );
        Ok(())
    }
}
