//! Password Reset Use Cases
//!
//! A single-use, time-boxed token is emailed as part of a link. At most one
//! unexpired token exists per email and at most five are issued per day.

use std::sync::Arc;

use chrono::{Duration, Utc};
use platform::mail::{Mailer, link_with_params};
use platform::password::{hash_secret, verify_secret};
use platform::rate_limit::WindowDecision;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::notification;
use crate::domain::entity::password_reset::PasswordResetToken;
use crate::domain::repository::{
    PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub const RESET_PATH: &str = "/reset-password";

pub struct RequestPasswordResetUseCase<U, P>
where
    U: UserRepository,
    P: PasswordResetRepository,
{
    user_repo: Arc<U>,
    reset_repo: Arc<P>,
    mailer: Mailer,
    config: Arc<AuthConfig>,
}

impl<U, P> RequestPasswordResetUseCase<U, P>
where
    U: UserRepository,
    P: PasswordResetRepository,
{
    pub fn new(user_repo: Arc<U>, reset_repo: Arc<P>, mailer: Mailer, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            reset_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let email = Email::new(email)?;
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let now = Utc::now();
        let existing = self.reset_repo.find_reset(&email).await?;

        if let Some(record) = &existing {
            if record.is_active(now) {
                return Err(AuthError::ResetTokenActive);
            }
        }

        let token = Uuid::new_v4().to_string();
        let token_hash = hash_secret(&token, None)?;
        let expires_at = now + Duration::milliseconds(self.config.reset_ttl_ms());

        match existing {
            Some(mut record) => {
                match self
                    .config
                    .reset_limit
                    .check(record.request_count, record.created_at, now)
                {
                    WindowDecision::Deny { retry_after_ms } => {
                        tracing::info!(retry_after_ms, "Password reset limit reached");
                        return Err(AuthError::ResetLimitReached);
                    }
                    WindowDecision::Reset => record.reset_window(now),
                    WindowDecision::Allow { .. } => {}
                }
                record.reissue(token_hash, expires_at);
                self.reset_repo.update_reset(&record).await?;
            }
            None => {
                let record = PasswordResetToken::first(email.clone(), token_hash, expires_at, now);
                self.reset_repo.insert_reset(&record).await?;
            }
        }

        let link = link_with_params(
            &self.config.frontend_url,
            RESET_PATH,
            &[("token", token.as_str()), ("email", email.as_str())],
        )
        .ok_or_else(|| AuthError::Internal("frontend URL is not a valid base URL".to_string()))?;

        self.mailer
            .send(notification::password_reset_mail(
                &user,
                &link,
                self.config.reset_ttl.as_secs() as i64 / 60,
            ))
            .await?;

        tracing::info!(user_id = %user.user_id, "Password reset link sent");

        Ok(())
    }
}

pub struct ResetPasswordInput {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<U, P, T>
where
    U: UserRepository,
    P: PasswordResetRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    reset_repo: Arc<P>,
    token_repo: Arc<T>,
    config: Arc<AuthConfig>,
}

impl<U, P, T> ResetPasswordUseCase<U, P, T>
where
    U: UserRepository,
    P: PasswordResetRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        reset_repo: Arc<P>,
        token_repo: Arc<T>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            reset_repo,
            token_repo,
            config,
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        let new_password = RawPassword::new(input.new_password)?;
        let email = Email::new(input.email)?;

        let mut record = self
            .reset_repo
            .find_reset(&email)
            .await?
            .filter(|r| r.is_active(Utc::now()))
            .ok_or(AuthError::ResetTokenInvalidOrExpired)?;

        if !verify_secret(input.token.trim(), &record.token_hash, None) {
            return Err(AuthError::ResetTokenMismatch);
        }

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        user.set_password(UserPassword::from_raw(&new_password, self.config.pepper())?);
        self.user_repo.update(&user).await?;

        record.mark_used();
        self.reset_repo.update_reset(&record).await?;
        self.reset_repo.delete_reset(&email).await?;

        // Sessions opened with the old password end here
        self.token_repo.delete_by_user(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, "Password reset");

        Ok(())
    }
}
