//! Listing filters, ordering and pages

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};

use crate::domain::entity::post::BlogPost;
use crate::domain::value_object::tags::Tags;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Popular,
    Views,
    Likes,
}

/// Filters combine with AND; tags match any
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BlogFilter {
    pub tags: Tags,
    pub author_id: Option<UserId>,
    /// Case-insensitive substring of title or content
    pub search: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl BlogFilter {
    /// In-process evaluation, mirrors the database query
    pub fn matches(&self, post: &BlogPost) -> bool {
        if !self.tags.is_empty() && !self.tags.intersects(&post.tags) {
            return false;
        }
        if self.author_id.is_some_and(|author| author != post.author_id) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = post.title.as_str().to_lowercase().contains(&needle)
                || post.content.as_str().to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| post.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| post.created_at > to) {
            return false;
        }
        true
    }
}

/// A normalised listing request; doubles as the listing cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub filter: BlogFilter,
    pub sort: SortOrder,
    /// 1-based
    pub page: u64,
    pub page_size: u64,
}

impl ListQuery {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of posts plus totals
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPage {
    pub items: Vec<BlogPost>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl BlogPage {
    pub fn new(items: Vec<BlogPost>, total: u64, query: &ListQuery) -> Self {
        Self {
            items,
            page: query.page,
            page_size: query.page_size,
            total,
            total_pages: total.div_ceil(query.page_size.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: u64, page_size: u64) -> ListQuery {
        ListQuery {
            filter: BlogFilter::default(),
            sort: SortOrder::Newest,
            page,
            page_size,
        }
    }

    #[test]
    fn test_skip() {
        assert_eq!(query(1, 10).skip(), 0);
        assert_eq!(query(3, 10).skip(), 20);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(BlogPage::new(vec![], 0, &query(1, 10)).total_pages, 0);
        assert_eq!(BlogPage::new(vec![], 10, &query(1, 10)).total_pages, 1);
        assert_eq!(BlogPage::new(vec![], 11, &query(1, 10)).total_pages, 2);
    }
}
