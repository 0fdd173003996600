//! Profile Use Cases
//!
//! Reading and editing the caller's own account.

use std::sync::Arc;

use kernel::error::app_error::AppError;
use kernel::id::UserId;
use platform::image::ImageHost;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::{AuthError, AuthResult};

pub const MAX_DISPLAY_NAME_CHARS: usize = 50;
pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_URL_CHARS: usize = 2048;

pub struct ProfileUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ProfileUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn get(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Absent fields keep their value, blank strings clear them
    pub async fn update(&self, user_id: &UserId, input: UpdateProfileInput) -> AuthResult<User> {
        let mut user = self.get(user_id).await?;

        let mut profile = user.profile.clone();
        if let Some(name) = input.name {
            profile.name = bounded("name", name, MAX_DISPLAY_NAME_CHARS)?;
        }
        if let Some(bio) = input.bio {
            profile.bio = bounded("bio", bio, MAX_BIO_CHARS)?;
        }
        if let Some(url) = input.avatar_url {
            profile.avatar_url = bounded("avatarUrl", url, MAX_URL_CHARS)?;
        }

        if profile != user.profile {
            user.set_profile(profile);
            self.user_repo.update(&user).await?;
            tracing::info!(user_id = %user.user_id, "Profile updated");
        }

        Ok(user)
    }
}

#[derive(Debug, Default)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

fn bounded(field: &'static str, value: String, max: usize) -> AuthResult<Option<String>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > max {
        return Err(AppError::bad_request(format!(
            "{field} must be at most {max} characters"
        ))
        .into());
    }
    Ok(Some(value.to_string()))
}

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> ChangePasswordUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, user_id: &UserId, input: ChangePasswordInput) -> AuthResult<()> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let current = RawPassword::for_verification(input.current_password);
        if !user.password_hash.verify(&current, self.config.pepper()) {
            return Err(AuthError::WrongCurrentPassword);
        }

        let new_password = RawPassword::new(input.new_password)?;
        user.set_password(UserPassword::from_raw(&new_password, self.config.pepper())?);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password changed");

        Ok(())
    }
}

pub struct UploadAvatarUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    images: ImageHost,
}

impl<U> UploadAvatarUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, images: ImageHost) -> Self {
        Self { user_repo, images }
    }

    pub async fn execute(&self, user_id: &UserId, bytes: &[u8], file_name: &str) -> AuthResult<User> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let file_name = format!("avatar-{}-{}", user.user_id, sanitize_file_name(file_name));
        let url = self.images.upload(bytes, &file_name).await?;

        user.set_avatar(url);
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, size = bytes.len(), "Avatar uploaded");

        Ok(user)
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .take(64)
        .collect();
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_trims_and_clears() {
        assert_eq!(bounded("bio", "  hi  ".into(), 10).unwrap(), Some("hi".into()));
        assert_eq!(bounded("bio", "   ".into(), 10).unwrap(), None);
        assert!(bounded("bio", "x".repeat(11), 10).is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../me.png"), "..me.png");
        assert_eq!(sanitize_file_name("ünï"), "n");
        assert_eq!(sanitize_file_name("///"), "image");
    }
}
