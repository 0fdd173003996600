//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in `infra`.

use kernel::id::UserId;
use uuid::Uuid;

use crate::domain::entity::{
    otp::Otp, password_reset::PasswordResetToken, refresh_token::RefreshToken, user::User,
};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::AuthResult;

#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; duplicates surface as conflicts
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Case-insensitive, via the canonical form
    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool>;

    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// At most one record per user, keyed by user id
#[trait_variant::make(RefreshTokenRepository: Send)]
pub trait LocalRefreshTokenRepository {
    /// Look up by the SHA-256 digest of the presented token
    async fn find_by_token(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>>;

    async fn find_by_user(&self, user_id: &UserId) -> AuthResult<Option<RefreshToken>>;

    async fn save(&self, token: &RefreshToken) -> AuthResult<()>;

    async fn revoke(&self, user_id: &UserId) -> AuthResult<()>;

    /// Overwrite the user's record with `token`
    async fn replace(&self, token: &RefreshToken) -> AuthResult<()>;

    async fn delete_by_user(&self, user_id: &UserId) -> AuthResult<()>;
}

#[trait_variant::make(OtpRepository: Send)]
pub trait LocalOtpRepository {
    async fn find_otp(&self, email: &Email) -> AuthResult<Option<Otp>>;

    async fn insert_otp(&self, otp: &Otp) -> AuthResult<()>;

    async fn update_otp(&self, otp: &Otp) -> AuthResult<()>;

    async fn delete_by_id(&self, otp_id: Uuid) -> AuthResult<()>;
}

#[trait_variant::make(PasswordResetRepository: Send)]
pub trait LocalPasswordResetRepository {
    async fn find_reset(&self, email: &Email) -> AuthResult<Option<PasswordResetToken>>;

    async fn insert_reset(&self, token: &PasswordResetToken) -> AuthResult<()>;

    async fn update_reset(&self, token: &PasswordResetToken) -> AuthResult<()>;

    async fn delete_reset(&self, email: &Email) -> AuthResult<()>;
}

/// Every repository the auth handlers need, behind one shared handle
pub trait AuthStore:
    UserRepository
    + RefreshTokenRepository
    + OtpRepository
    + PasswordResetRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + RefreshTokenRepository
        + OtpRepository
        + PasswordResetRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
