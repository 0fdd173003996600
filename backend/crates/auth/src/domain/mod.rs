//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    otp::Otp, password_reset::PasswordResetToken, refresh_token::RefreshToken, user::User,
};
pub use repository::{
    AuthStore, OtpRepository, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
