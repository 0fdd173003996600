//! Infrastructure Layer
//!
//! Repository implementations.

pub mod memory;
pub mod mongo;

pub use memory::InMemoryBlogRepository;
pub use mongo::MongoBlogRepository;
