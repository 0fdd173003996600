//! Presentation Layer
//!
//! HTTP handlers, DTOs and routers.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::BlogAppState;
pub use router::{ai_router, blog_router};
