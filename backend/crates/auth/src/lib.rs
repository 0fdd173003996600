//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Registration and login with user name or email + password
//! - HS256 access/refresh token pairs, refresh rotation near expiry
//! - Email verification with rate-limited one-time codes
//! - Password reset links, single use, five per day
//! - Role lattice (User, Admin, SuperAdmin)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Refresh tokens, OTP codes and reset tokens are stored only as hashes
//! - Tokens travel in HttpOnly cookies; access tokens also as Bearer

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token::TokenIssuer;
pub use domain::repository::AuthStore;
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAuthRepository, MongoAuthRepository};
pub use presentation::handlers::AuthAppState;
pub use presentation::middleware::{
    AccessGuard, AuthenticatedUser, require_access_token, require_admin,
};
pub use presentation::router::{auth_router, users_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
