//! Application Layer
//!
//! Use cases and application services.

pub mod ai;
pub mod comments;
pub mod config;
pub mod listing;
pub mod posts;
pub mod reactions;

// Re-exports
pub use ai::{AiWriterUseCase, Draft, GenerateInput, ImproveInput, Tone};
pub use comments::CommentUseCase;
pub use config::BlogConfig;
pub use listing::{ListPostsInput, ListPostsUseCase, ListingCache};
pub use posts::{
    CreatePostInput, CreatePostUseCase, DeletePostUseCase, GetPostUseCase, UpdatePostInput,
    UpdatePostUseCase,
};
pub use reactions::{ReactionOutput, ReactionUseCase};
