//! HTTP Handlers

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use auth::AuthenticatedUser;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::error::app_error::AppError;
use kernel::id::{BlogId, CommentId, UserId};
use platform::deadline::with_deadline;
use platform::genai::TextGenerator;

use crate::application::{
    AiWriterUseCase, BlogConfig, CommentUseCase, CreatePostInput, CreatePostUseCase,
    DeletePostUseCase, GenerateInput, GetPostUseCase, ImproveInput, ListPostsInput,
    ListPostsUseCase, ListingCache, ReactionUseCase, UpdatePostInput, UpdatePostUseCase,
};
use crate::domain::entity::post::Actor;
use crate::domain::repository::BlogStore;
use crate::error::{BlogError, BlogResult};
use crate::presentation::dto::{
    CommentRequest, CommentResponse, CreatePostRequest, DraftResponse, GenerateRequest,
    ImproveRequest, ListPostsParams, PostListResponse, PostResponse, ReactionRequest,
    ReactionResponse, UpdatePostRequest,
};

/// Shared state for blog handlers
#[derive(Clone)]
pub struct BlogAppState<S>
where
    S: BlogStore,
{
    pub store: Arc<S>,
    pub config: Arc<BlogConfig>,
    pub listing_cache: ListingCache,
    pub generator: Arc<TextGenerator>,
}

impl<S> BlogAppState<S>
where
    S: BlogStore,
{
    pub fn new(store: S, config: BlogConfig, generator: TextGenerator) -> Self {
        Self {
            store: Arc::new(store),
            listing_cache: ListingCache::new(config.listing_cache_ttl),
            config: Arc::new(config),
            generator: Arc::new(generator),
        }
    }
}

/// Run a use case under a deadline
async fn within<T>(deadline: Duration, fut: impl Future<Output = BlogResult<T>>) -> BlogResult<T> {
    with_deadline(deadline, fut).await?
}

fn actor(user: &AuthenticatedUser) -> Actor {
    Actor {
        user_id: user.user_id,
        username: user.username.clone(),
        is_admin: user.is_admin(),
    }
}

fn parse_blog_id(raw: &str) -> BlogResult<BlogId> {
    raw.parse()
        .map_err(|_| AppError::bad_request("Invalid blog id").into())
}

fn parse_comment_id(raw: &str) -> BlogResult<CommentId> {
    raw.parse()
        .map_err(|_| AppError::bad_request("Invalid comment id").into())
}

// ============================================================================
// Posts
// ============================================================================

/// GET /api/blogs
pub async fn list_posts<S>(
    State(state): State<BlogAppState<S>>,
    Query(params): Query<ListPostsParams>,
) -> BlogResult<Json<PostListResponse>>
where
    S: BlogStore,
{
    let author_id = params
        .author_id
        .as_deref()
        .map(|raw| {
            raw.parse::<UserId>()
                .map_err(|_| BlogError::from(AppError::bad_request("Invalid author id")))
        })
        .transpose()?;

    let input = ListPostsInput {
        page: params.page,
        page_size: params.page_size,
        tags: params.tags,
        author_id,
        search: params.search,
        created_from: params.from,
        created_to: params.to,
        sort: params.sort,
    };

    let use_case = ListPostsUseCase::new(
        state.store.clone(),
        state.listing_cache.clone(),
        state.config.clone(),
    );
    let page = within(state.config.request_timeout, use_case.execute(input)).await?;

    Ok(Json(PostListResponse::from(&page)))
}

/// POST /api/blogs
pub async fn create_post<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Json(req): Json<CreatePostRequest>,
) -> BlogResult<impl IntoResponse>
where
    S: BlogStore,
{
    let use_case = CreatePostUseCase::new(state.store.clone());
    let author = actor(&user);

    let input = CreatePostInput {
        title: req.title,
        content: req.content,
        tags: req.tags,
    };

    let post = within(state.config.request_timeout, use_case.execute(&author, input)).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(&post))))
}

/// GET /api/blogs/{id}
pub async fn get_post<S>(
    State(state): State<BlogAppState<S>>,
    Path(id): Path<String>,
) -> BlogResult<Json<PostResponse>>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = GetPostUseCase::new(state.store.clone());

    let post = within(state.config.request_timeout, use_case.execute(&blog_id)).await?;
    Ok(Json(PostResponse::from(&post)))
}

/// PUT /api/blogs/{id}
pub async fn update_post<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(req): Json<UpdatePostRequest>,
) -> BlogResult<Json<PostResponse>>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = UpdatePostUseCase::new(state.store.clone());
    let editor = actor(&user);

    let input = UpdatePostInput {
        title: req.title,
        content: req.content,
        tags: req.tags,
    };

    let post = within(
        state.config.request_timeout,
        use_case.execute(&editor, &blog_id, input),
    )
    .await?;
    Ok(Json(PostResponse::from(&post)))
}

/// DELETE /api/blogs/{id}
pub async fn delete_post<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> BlogResult<StatusCode>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = DeletePostUseCase::new(
        state.store.clone(),
        state.store.clone(),
        state.store.clone(),
    );
    let caller = actor(&user);

    within(state.config.request_timeout, use_case.execute(&caller, &blog_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comments
// ============================================================================

/// GET /api/blogs/{id}/comments
pub async fn list_comments<S>(
    State(state): State<BlogAppState<S>>,
    Path(id): Path<String>,
) -> BlogResult<Json<Vec<CommentResponse>>>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = CommentUseCase::new(state.store.clone(), state.store.clone());

    let comments = within(state.config.request_timeout, use_case.list(&blog_id)).await?;
    Ok(Json(comments.iter().map(CommentResponse::from).collect()))
}

/// POST /api/blogs/{id}/comments
pub async fn add_comment<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> BlogResult<impl IntoResponse>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = CommentUseCase::new(state.store.clone(), state.store.clone());
    let author = actor(&user);

    let comment = within(
        state.config.request_timeout,
        use_case.add(&author, &blog_id, req.content),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(&comment))))
}

/// DELETE /api/blogs/{id}/comments/{comment_id}
pub async fn delete_comment<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> BlogResult<StatusCode>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let comment_id = parse_comment_id(&comment_id)?;
    let use_case = CommentUseCase::new(state.store.clone(), state.store.clone());
    let caller = actor(&user);

    within(
        state.config.request_timeout,
        use_case.delete(&caller, &blog_id, &comment_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Reactions
// ============================================================================

/// POST /api/blogs/{id}/reactions
pub async fn react<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(req): Json<ReactionRequest>,
) -> BlogResult<Json<ReactionResponse>>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = ReactionUseCase::new(state.store.clone(), state.store.clone());

    let output = within(
        state.config.request_timeout,
        use_case.react(&user.user_id, &blog_id, req.reaction),
    )
    .await?;
    Ok(Json(ReactionResponse::from(&output)))
}

/// DELETE /api/blogs/{id}/reactions
pub async fn remove_reaction<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> BlogResult<Json<ReactionResponse>>
where
    S: BlogStore,
{
    let blog_id = parse_blog_id(&id)?;
    let use_case = ReactionUseCase::new(state.store.clone(), state.store.clone());

    let output = within(
        state.config.request_timeout,
        use_case.remove(&user.user_id, &blog_id),
    )
    .await?;
    Ok(Json(ReactionResponse::from(&output)))
}

// ============================================================================
// AI
// ============================================================================

/// POST /api/ai/blog/generate
pub async fn generate_draft<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Json(req): Json<GenerateRequest>,
) -> BlogResult<Json<DraftResponse>>
where
    S: BlogStore,
{
    let use_case = AiWriterUseCase::new(state.generator.clone());

    let input = GenerateInput {
        topic: req.topic,
        keywords: req.keywords,
        tone: req.tone,
    };

    tracing::debug!(user_id = %user.user_id, "Draft requested");
    let draft = within(state.config.ai_timeout, use_case.generate(input)).await?;
    Ok(Json(DraftResponse::from(draft)))
}

/// POST /api/ai/blog/improve
pub async fn improve_draft<S>(
    State(state): State<BlogAppState<S>>,
    user: AuthenticatedUser,
    Json(req): Json<ImproveRequest>,
) -> BlogResult<Json<DraftResponse>>
where
    S: BlogStore,
{
    let use_case = AiWriterUseCase::new(state.generator.clone());

    let input = ImproveInput {
        title: req.title,
        content: req.content,
        instructions: req.instructions,
    };

    tracing::debug!(user_id = %user.user_id, "Improvement requested");
    let draft = within(state.config.ai_timeout, use_case.improve(input)).await?;
    Ok(Json(DraftResponse::from(draft)))
}
