//! Logout Use Case
//!
//! Revokes and removes the caller's refresh token. Cookie clearing happens
//! in the handler whatever the outcome here.

use std::sync::Arc;

use chrono::Utc;

use crate::application::token::TokenIssuer;
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::RefreshTokenRepository;
use crate::error::{AuthError, AuthResult};

pub struct LogoutUseCase<T>
where
    T: RefreshTokenRepository,
{
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
}

impl<T> LogoutUseCase<T>
where
    T: RefreshTokenRepository,
{
    pub fn new(token_repo: Arc<T>, issuer: Arc<TokenIssuer>) -> Self {
        Self { token_repo, issuer }
    }

    pub async fn execute(&self, cookie_token: Option<String>) -> AuthResult<()> {
        let token = cookie_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let stored = self
            .token_repo
            .find_by_token(&RefreshToken::digest(&token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !stored.is_active(Utc::now()) {
            return Err(AuthError::RefreshTokenExpired);
        }

        self.issuer
            .validate_refresh_token(&token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        self.token_repo.revoke(&stored.user_id).await?;
        self.token_repo.delete_by_user(&stored.user_id).await?;

        tracing::info!(user_id = %stored.user_id, "User logged out");

        Ok(())
    }
}
