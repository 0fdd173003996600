//! Reaction entity
//!
//! One reaction per (post, user). Reacting again with the same kind is a
//! no-op; switching kind moves the vote.

use chrono::{DateTime, Utc};
use kernel::id::{BlogId, UserId};
use serde::{Deserialize, Serialize};

use crate::domain::entity::post::EngagementDelta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }

    fn delta(&self, by: i64) -> EngagementDelta {
        match self {
            ReactionKind::Like => EngagementDelta {
                likes: by,
                ..EngagementDelta::default()
            },
            ReactionKind::Dislike => EngagementDelta {
                dislikes: by,
                ..EngagementDelta::default()
            },
        }
    }

    /// Counter change for moving from `previous` to `next`
    pub fn transition(
        previous: Option<ReactionKind>,
        next: Option<ReactionKind>,
    ) -> EngagementDelta {
        if previous == next {
            return EngagementDelta::default();
        }
        let removed = previous.map(|kind| kind.delta(-1)).unwrap_or_default();
        let added = next.map(|kind| kind.delta(1)).unwrap_or_default();
        EngagementDelta {
            views: 0,
            likes: removed.likes + added.likes,
            dislikes: removed.dislikes + added.dislikes,
            comments: 0,
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogReaction {
    pub blog_id: BlogId,
    pub user_id: UserId,
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogReaction {
    pub fn new(blog_id: BlogId, user_id: UserId, kind: ReactionKind) -> Self {
        let now = Utc::now();
        Self {
            blog_id,
            user_id,
            kind,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn switch_to(&mut self, kind: ReactionKind) {
        self.kind = kind;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReactionKind::*;

    #[test]
    fn test_transitions() {
        assert!(ReactionKind::transition(Some(Like), Some(Like)).is_zero());
        assert!(ReactionKind::transition(None, None).is_zero());

        let first = ReactionKind::transition(None, Some(Like));
        assert_eq!((first.likes, first.dislikes), (1, 0));

        let switch = ReactionKind::transition(Some(Like), Some(Dislike));
        assert_eq!((switch.likes, switch.dislikes), (-1, 1));

        let removed = ReactionKind::transition(Some(Dislike), None);
        assert_eq!((removed.likes, removed.dislikes), (0, -1));
    }

    #[test]
    fn test_serde_codes() {
        assert_eq!(serde_json::to_string(&Dislike).unwrap(), "\"dislike\"");
        let kind: ReactionKind = serde_json::from_str("\"like\"").unwrap();
        assert_eq!(kind, Like);
    }
}
