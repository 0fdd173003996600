//! MongoDB Repository Implementations

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use kernel::id::{BlogId, CommentId, UserId};
use mongodb::bson::{self, Document, doc};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{
    comment::BlogComment,
    post::{BlogPost, Engagement, EngagementDelta},
    reaction::{BlogReaction, ReactionKind},
};
use crate::domain::listing::{BlogFilter, ListQuery, SortOrder};
use crate::domain::repository::{CommentRepository, PostRepository, ReactionRepository};
use crate::domain::value_object::{
    post_content::{CommentText, PostContent},
    tags::Tags,
    title::Title,
};
use crate::error::{BlogError, BlogResult};

const BLOGS: &str = "blogs";
const COMMENTS: &str = "comments";
const REACTIONS: &str = "reactions";

/// MongoDB-backed blog repository
#[derive(Clone)]
pub struct MongoBlogRepository {
    db: Database,
}

impl MongoBlogRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn blogs(&self) -> Collection<PostDocument> {
        self.db.collection(BLOGS)
    }

    fn comments(&self) -> Collection<CommentDocument> {
        self.db.collection(COMMENTS)
    }

    fn reactions(&self) -> Collection<ReactionDocument> {
        self.db.collection(REACTIONS)
    }

    /// Create the unique and lookup indexes the repositories rely on
    pub async fn ensure_indexes(&self) -> BlogResult<()> {
        for keys in [
            doc! { "created_at": -1 },
            doc! { "popularity": -1 },
            doc! { "tags": 1 },
            doc! { "author_id": 1 },
        ] {
            self.blogs()
                .create_index(IndexModel::builder().keys(keys).build())
                .await?;
        }
        self.comments()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "blog_id": 1, "created_at": 1 })
                    .build(),
            )
            .await?;
        self.reactions()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "blog_id": 1, "user_id": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;

        tracing::info!("Blog indexes ensured");
        Ok(())
    }
}

// ============================================================================
// Post Repository Implementation
// ============================================================================

impl PostRepository for MongoBlogRepository {
    async fn insert_post(&self, post: &BlogPost) -> BlogResult<()> {
        self.blogs().insert_one(PostDocument::from_post(post)).await?;
        Ok(())
    }

    async fn find_post(&self, blog_id: &BlogId) -> BlogResult<Option<BlogPost>> {
        self.blogs()
            .find_one(doc! { "_id": blog_id.to_string() })
            .await?
            .map(PostDocument::into_post)
            .transpose()
    }

    async fn update_post(&self, post: &BlogPost) -> BlogResult<()> {
        self.blogs()
            .update_one(
                doc! { "_id": post.blog_id.to_string() },
                doc! { "$set": {
                    "title": post.title.as_str(),
                    "content": post.content.as_str(),
                    "tags": post.tags.as_slice().to_vec(),
                    "updated_at": to_bson(post.updated_at),
                } },
            )
            .await?;
        Ok(())
    }

    async fn delete_post(&self, blog_id: &BlogId) -> BlogResult<bool> {
        let result = self
            .blogs()
            .delete_one(doc! { "_id": blog_id.to_string() })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_posts(&self, query: &ListQuery) -> BlogResult<(Vec<BlogPost>, u64)> {
        let pipeline = [
            doc! { "$match": filter_document(&query.filter) },
            doc! { "$facet": {
                "items": [
                    { "$sort": sort_document(query.sort) },
                    { "$skip": to_i64(query.skip()) },
                    { "$limit": to_i64(query.page_size) },
                ],
                "total": [ { "$count": "count" } ],
            } },
        ];

        let facet = self
            .blogs()
            .aggregate(pipeline)
            .await?
            .try_next()
            .await?
            .map(bson::from_document::<ListingFacet>)
            .transpose()?;

        let Some(facet) = facet else {
            return Ok((Vec::new(), 0));
        };

        let total = facet
            .total
            .first()
            .map(|c| u64::try_from(c.count).unwrap_or(0))
            .unwrap_or(0);
        let items = facet
            .items
            .into_iter()
            .map(PostDocument::into_post)
            .collect::<BlogResult<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn adjust_engagement(
        &self,
        blog_id: &BlogId,
        delta: EngagementDelta,
    ) -> BlogResult<Option<BlogPost>> {
        if delta.is_zero() {
            return self.find_post(blog_id).await;
        }

        self.blogs()
            .find_one_and_update(
                doc! { "_id": blog_id.to_string() },
                doc! { "$inc": {
                    "views": delta.views,
                    "likes": delta.likes,
                    "dislikes": delta.dislikes,
                    "comment_count": delta.comments,
                    "popularity": delta.popularity(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .map(PostDocument::into_post)
            .transpose()
    }
}

// ============================================================================
// Comment Repository Implementation
// ============================================================================

impl CommentRepository for MongoBlogRepository {
    async fn insert_comment(&self, comment: &BlogComment) -> BlogResult<()> {
        self.comments()
            .insert_one(CommentDocument::from_comment(comment))
            .await?;
        Ok(())
    }

    async fn find_comment(&self, comment_id: &CommentId) -> BlogResult<Option<BlogComment>> {
        self.comments()
            .find_one(doc! { "_id": comment_id.to_string() })
            .await?
            .map(CommentDocument::into_comment)
            .transpose()
    }

    async fn list_comments(&self, blog_id: &BlogId) -> BlogResult<Vec<BlogComment>> {
        let documents: Vec<CommentDocument> = self
            .comments()
            .find(doc! { "blog_id": blog_id.to_string() })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;

        documents
            .into_iter()
            .map(CommentDocument::into_comment)
            .collect()
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> BlogResult<bool> {
        let result = self
            .comments()
            .delete_one(doc! { "_id": comment_id.to_string() })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_comments_for(&self, blog_id: &BlogId) -> BlogResult<u64> {
        let result = self
            .comments()
            .delete_many(doc! { "blog_id": blog_id.to_string() })
            .await?;
        Ok(result.deleted_count)
    }
}

// ============================================================================
// Reaction Repository Implementation
// ============================================================================

impl ReactionRepository for MongoBlogRepository {
    async fn find_reaction(
        &self,
        blog_id: &BlogId,
        user_id: &UserId,
    ) -> BlogResult<Option<BlogReaction>> {
        self.reactions()
            .find_one(doc! { "_id": reaction_key(blog_id, user_id) })
            .await?
            .map(ReactionDocument::into_reaction)
            .transpose()
    }

    async fn upsert_reaction(&self, reaction: &BlogReaction) -> BlogResult<()> {
        self.reactions()
            .replace_one(
                doc! { "_id": reaction_key(&reaction.blog_id, &reaction.user_id) },
                ReactionDocument::from_reaction(reaction),
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_reaction(&self, blog_id: &BlogId, user_id: &UserId) -> BlogResult<bool> {
        let result = self
            .reactions()
            .delete_one(doc! { "_id": reaction_key(blog_id, user_id) })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_reactions_for(&self, blog_id: &BlogId) -> BlogResult<u64> {
        let result = self
            .reactions()
            .delete_many(doc! { "blog_id": blog_id.to_string() })
            .await?;
        Ok(result.deleted_count)
    }
}

// ============================================================================
// Query building
// ============================================================================

fn filter_document(filter: &BlogFilter) -> Document {
    let mut document = Document::new();

    if !filter.tags.is_empty() {
        document.insert("tags", doc! { "$in": filter.tags.as_slice().to_vec() });
    }
    if let Some(author_id) = &filter.author_id {
        document.insert("author_id", author_id.to_string());
    }
    if let Some(search) = &filter.search {
        let pattern = escape_regex(search);
        document.insert(
            "$or",
            vec![
                doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "content": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }

    let mut created = Document::new();
    if let Some(from) = filter.created_from {
        created.insert("$gte", to_bson(from));
    }
    if let Some(to) = filter.created_to {
        created.insert("$lte", to_bson(to));
    }
    if !created.is_empty() {
        document.insert("created_at", created);
    }

    document
}

/// Requested key first, then a tiebreaker for stable pages
fn sort_document(sort: SortOrder) -> Document {
    match sort {
        SortOrder::Newest => doc! { "created_at": -1, "_id": -1 },
        SortOrder::Oldest => doc! { "created_at": 1, "_id": 1 },
        SortOrder::Popular => doc! { "popularity": -1, "created_at": -1 },
        SortOrder::Views => doc! { "views": -1, "created_at": -1 },
        SortOrder::Likes => doc! { "likes": -1, "created_at": -1 },
    }
}

/// Literal match for user-supplied search text
fn escape_regex(text: &str) -> String {
    const SPECIAL: &[char] = &[
        '\\', '.', '+', '*', '?', '(', ')', '|', '[', ']', '{', '}', '^', '$', '#', '-',
    ];
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn reaction_key(blog_id: &BlogId, user_id: &UserId) -> String {
    format!("{blog_id}:{user_id}")
}

// ============================================================================
// Documents
// ============================================================================

fn to_bson(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson(at: bson::DateTime) -> BlogResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis())
        .ok_or_else(|| BlogError::Malformed("Stored timestamp out of range".to_string()))
}

fn parse_uuid(raw: &str) -> BlogResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| BlogError::Malformed(format!("Invalid stored id: {e}")))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct ListingFacet {
    items: Vec<PostDocument>,
    total: Vec<CountDocument>,
}

#[derive(Debug, Deserialize)]
struct CountDocument {
    count: i64,
}

/// Popularity is stored so listings can sort on it
#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    content: String,
    author_id: String,
    author_name: String,
    tags: Vec<String>,
    views: i64,
    likes: i64,
    dislikes: i64,
    comment_count: i64,
    popularity: i64,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl PostDocument {
    fn from_post(post: &BlogPost) -> Self {
        let engagement = &post.engagement;
        Self {
            id: post.blog_id.to_string(),
            title: post.title.as_str().to_string(),
            content: post.content.as_str().to_string(),
            author_id: post.author_id.to_string(),
            author_name: post.author_name.clone(),
            tags: post.tags.as_slice().to_vec(),
            views: to_i64(engagement.views),
            likes: to_i64(engagement.likes),
            dislikes: to_i64(engagement.dislikes),
            comment_count: to_i64(engagement.comments),
            popularity: post.popularity(),
            created_at: to_bson(post.created_at),
            updated_at: to_bson(post.updated_at),
        }
    }

    fn into_post(self) -> BlogResult<BlogPost> {
        Ok(BlogPost {
            blog_id: BlogId::from_uuid(parse_uuid(&self.id)?),
            title: Title::from_db(self.title),
            content: PostContent::from_db(self.content),
            author_id: UserId::from_uuid(parse_uuid(&self.author_id)?),
            author_name: self.author_name,
            tags: Tags::from_db(self.tags),
            engagement: Engagement {
                views: to_u64(self.views),
                likes: to_u64(self.likes),
                dislikes: to_u64(self.dislikes),
                comments: to_u64(self.comment_count),
            },
            created_at: from_bson(self.created_at)?,
            updated_at: from_bson(self.updated_at)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentDocument {
    #[serde(rename = "_id")]
    id: String,
    blog_id: String,
    author_id: String,
    author_name: String,
    content: String,
    created_at: bson::DateTime,
}

impl CommentDocument {
    fn from_comment(comment: &BlogComment) -> Self {
        Self {
            id: comment.comment_id.to_string(),
            blog_id: comment.blog_id.to_string(),
            author_id: comment.author_id.to_string(),
            author_name: comment.author_name.clone(),
            content: comment.content.as_str().to_string(),
            created_at: to_bson(comment.created_at),
        }
    }

    fn into_comment(self) -> BlogResult<BlogComment> {
        Ok(BlogComment {
            comment_id: CommentId::from_uuid(parse_uuid(&self.id)?),
            blog_id: BlogId::from_uuid(parse_uuid(&self.blog_id)?),
            author_id: UserId::from_uuid(parse_uuid(&self.author_id)?),
            author_name: self.author_name,
            content: CommentText::from_db(self.content),
            created_at: from_bson(self.created_at)?,
        })
    }
}

/// Keyed by `{blog_id}:{user_id}` so upserts converge to one per pair
#[derive(Debug, Serialize, Deserialize)]
struct ReactionDocument {
    #[serde(rename = "_id")]
    id: String,
    blog_id: String,
    user_id: String,
    kind: ReactionKind,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl ReactionDocument {
    fn from_reaction(reaction: &BlogReaction) -> Self {
        Self {
            id: reaction_key(&reaction.blog_id, &reaction.user_id),
            blog_id: reaction.blog_id.to_string(),
            user_id: reaction.user_id.to_string(),
            kind: reaction.kind,
            created_at: to_bson(reaction.created_at),
            updated_at: to_bson(reaction.updated_at),
        }
    }

    fn into_reaction(self) -> BlogResult<BlogReaction> {
        Ok(BlogReaction {
            blog_id: BlogId::from_uuid(parse_uuid(&self.blog_id)?),
            user_id: UserId::from_uuid(parse_uuid(&self.user_id)?),
            kind: self.kind,
            created_at: from_bson(self.created_at)?,
            updated_at: from_bson(self.updated_at)?,
        })
    }
}
