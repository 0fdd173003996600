//! Domain Layer
//!
//! Entities, value objects, listing types and repository traits.

pub mod entity;
pub mod listing;
pub mod repository;
pub mod value_object;

pub use entity::{
    comment::BlogComment,
    post::{Actor, BlogPost, Engagement, EngagementDelta},
    reaction::{BlogReaction, ReactionKind},
};
pub use listing::{BlogFilter, BlogPage, ListQuery, SortOrder};
pub use repository::{BlogStore, CommentRepository, PostRepository, ReactionRepository};
