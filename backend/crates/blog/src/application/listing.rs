//! List Posts Use Case
//!
//! Normalises the request, then reads through the TTL listing cache.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppError;
use kernel::id::UserId;
use platform::cache::TtlCache;

use crate::application::config::BlogConfig;
use crate::domain::listing::{BlogFilter, BlogPage, ListQuery, SortOrder};
use crate::domain::repository::PostRepository;
use crate::domain::value_object::tags::Tags;
use crate::error::{BlogError, BlogResult};

pub const MAX_SEARCH_CHARS: usize = 100;

/// Shared listing cache, keyed by the normalised query
pub type ListingCache = TtlCache<ListQuery, BlogPage>;

/// Raw listing parameters as received
#[derive(Debug, Clone, Default)]
pub struct ListPostsInput {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Comma-separated
    pub tags: Option<String>,
    pub author_id: Option<UserId>,
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub sort: Option<SortOrder>,
}

impl ListPostsInput {
    pub fn normalize(self, config: &BlogConfig) -> BlogResult<ListQuery> {
        let tags = match self.tags.as_deref() {
            Some(raw) => Tags::parse_csv(raw)?,
            None => Tags::default(),
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if search
            .as_ref()
            .is_some_and(|s| s.chars().count() > MAX_SEARCH_CHARS)
        {
            return Err(AppError::bad_request(format!(
                "Search text must be at most {MAX_SEARCH_CHARS} characters"
            ))
            .into());
        }

        if let (Some(from), Some(to)) = (self.created_from, self.created_to) {
            if from > to {
                return Err(AppError::bad_request("'from' must not be after 'to'").into());
            }
        }

        Ok(ListQuery {
            filter: BlogFilter {
                tags,
                author_id: self.author_id,
                search,
                created_from: self.created_from,
                created_to: self.created_to,
            },
            sort: self.sort.unwrap_or_default(),
            page: self.page.unwrap_or(1).max(1),
            page_size: config.page_size(self.page_size),
        })
    }
}

pub struct ListPostsUseCase<P>
where
    P: PostRepository,
{
    post_repo: Arc<P>,
    cache: ListingCache,
    config: Arc<BlogConfig>,
}

impl<P> ListPostsUseCase<P>
where
    P: PostRepository,
{
    pub fn new(post_repo: Arc<P>, cache: ListingCache, config: Arc<BlogConfig>) -> Self {
        Self {
            post_repo,
            cache,
            config,
        }
    }

    pub async fn execute(&self, input: ListPostsInput) -> BlogResult<BlogPage> {
        let query = input.normalize(&self.config)?;
        let post_repo = &self.post_repo;
        let key = &query;

        self.cache
            .get_or_try_insert_with(query.clone(), || async move {
                let query = key;
                let (items, total) = post_repo.list_posts(query).await?;
                tracing::debug!(
                    page = query.page,
                    page_size = query.page_size,
                    total,
                    "Listing loaded"
                );
                Ok::<_, BlogError>(BlogPage::new(items, total, query))
            })
            .await
    }
}
