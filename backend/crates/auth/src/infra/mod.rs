//! Infrastructure Layer
//!
//! Database implementations.

pub mod memory;
pub mod mongo;

pub use memory::InMemoryAuthRepository;
pub use mongo::MongoAuthRepository;
