//! Blog Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Posts, comments, reactions, listing types, repository traits
//! - `application/` - Use cases and the listing cache
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, routers
//!
//! ## Features
//! - Post CRUD; authors and admins may edit or delete
//! - Listing with tag, author, text and date filters, five sort orders and
//!   page totals, served through a TTL cache
//! - Comments and idempotent like/dislike reactions
//! - Popularity: `views + 3*likes + 2*comments - 2*dislikes`
//! - AI drafting and rewriting

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::BlogConfig;
pub use domain::repository::BlogStore;
pub use error::{BlogError, BlogResult};
pub use infra::{InMemoryBlogRepository, MongoBlogRepository};
pub use presentation::handlers::BlogAppState;
pub use presentation::router::{ai_router, blog_router};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::listing::*;
    pub use crate::presentation::dto::*;
}
