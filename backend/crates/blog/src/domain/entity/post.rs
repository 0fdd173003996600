//! Blog post entity

use chrono::{DateTime, Utc};
use kernel::id::{BlogId, UserId};

use crate::domain::value_object::{post_content::PostContent, tags::Tags, title::Title};

/// Who is acting on a post or comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl Actor {
    /// Authors may edit their own content; admins may edit anything
    pub fn can_modify(&self, author_id: &UserId) -> bool {
        self.is_admin || &self.user_id == author_id
    }
}

/// Engagement counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Engagement {
    pub views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub comments: u64,
}

impl Engagement {
    /// `views + 3*likes + 2*comments - 2*dislikes`
    pub fn popularity(&self) -> i64 {
        let score = i128::from(self.views) + 3 * i128::from(self.likes)
            + 2 * i128::from(self.comments)
            - 2 * i128::from(self.dislikes);
        i64::try_from(score).unwrap_or(if score < 0 { i64::MIN } else { i64::MAX })
    }

    /// Apply a delta, saturating at zero
    pub fn apply(&mut self, delta: EngagementDelta) {
        fn shift(value: &mut u64, by: i64) {
            *value = if by.is_negative() {
                value.saturating_sub(by.unsigned_abs())
            } else {
                value.saturating_add(by as u64)
            };
        }
        shift(&mut self.views, delta.views);
        shift(&mut self.likes, delta.likes);
        shift(&mut self.dislikes, delta.dislikes);
        shift(&mut self.comments, delta.comments);
    }
}

/// Signed change to the counters of one post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementDelta {
    pub views: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub comments: i64,
}

impl EngagementDelta {
    pub fn view() -> Self {
        Self {
            views: 1,
            ..Self::default()
        }
    }

    pub fn comment_added() -> Self {
        Self {
            comments: 1,
            ..Self::default()
        }
    }

    pub fn comment_removed() -> Self {
        Self {
            comments: -1,
            ..Self::default()
        }
    }

    /// Change in popularity this delta causes. The score is linear, so it
    /// can be applied with the same atomic increment as the counters.
    pub fn popularity(&self) -> i64 {
        self.views + 3 * self.likes + 2 * self.comments - 2 * self.dislikes
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogPost {
    pub blog_id: BlogId,
    pub title: Title,
    pub content: PostContent,
    pub author_id: UserId,
    pub author_name: String,
    pub tags: Tags,
    pub engagement: Engagement,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn new(title: Title, content: PostContent, tags: Tags, author: &Actor) -> Self {
        let now = Utc::now();
        Self {
            blog_id: BlogId::new(),
            title,
            content,
            author_id: author.user_id,
            author_name: author.username.clone(),
            tags,
            engagement: Engagement::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn popularity(&self) -> i64 {
        self.engagement.popularity()
    }

    /// Replace the editable fields that are present
    pub fn edit(&mut self, title: Option<Title>, content: Option<PostContent>, tags: Option<Tags>) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popularity_formula() {
        let engagement = Engagement {
            views: 10,
            likes: 4,
            dislikes: 3,
            comments: 2,
        };
        assert_eq!(engagement.popularity(), 10 + 12 + 4 - 6);
    }

    #[test]
    fn test_popularity_can_go_negative() {
        let engagement = Engagement {
            dislikes: 2,
            ..Engagement::default()
        };
        assert_eq!(engagement.popularity(), -4);
    }

    #[test]
    fn test_delta_matches_score_change() {
        let mut engagement = Engagement {
            views: 5,
            likes: 1,
            dislikes: 1,
            comments: 1,
        };
        let before = engagement.popularity();
        let delta = EngagementDelta {
            likes: 1,
            dislikes: -1,
            ..EngagementDelta::default()
        };
        engagement.apply(delta);
        assert_eq!(engagement.popularity() - before, delta.popularity());
    }

    #[test]
    fn test_apply_saturates() {
        let mut engagement = Engagement::default();
        engagement.apply(EngagementDelta::comment_removed());
        assert_eq!(engagement.comments, 0);
    }

    #[test]
    fn test_actor_permissions() {
        let author = UserId::new();
        let owner = Actor {
            user_id: author,
            username: "alice".into(),
            is_admin: false,
        };
        let stranger = Actor {
            user_id: UserId::new(),
            username: "bob".into(),
            is_admin: false,
        };
        let admin = Actor {
            is_admin: true,
            ..stranger.clone()
        };
        assert!(owner.can_modify(&author));
        assert!(!stranger.can_modify(&author));
        assert!(admin.can_modify(&author));
    }
}
