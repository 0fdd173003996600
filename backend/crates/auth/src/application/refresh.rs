//! Refresh Use Case
//!
//! Exchanges a stored refresh token for a new access token. The refresh
//! token itself is only rotated once it is close to expiry.

use std::sync::Arc;

use chrono::{Duration, Utc};
use platform::crypto::constant_time_eq;

use crate::application::config::AuthConfig;
use crate::application::token::{IssuedToken, TokenIssuer};
use crate::domain::entity::refresh_token::RefreshToken;
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

pub struct RefreshInput {
    /// `refreshToken` from the JSON body, if any
    pub body_token: Option<String>,
    /// Value of the refresh cookie, if any
    pub cookie_token: Option<String>,
}

#[derive(Debug)]
pub struct RefreshOutput {
    pub access: IssuedToken,
    /// The refresh token the client should keep using
    pub refresh_token: String,
    /// Set when a new refresh token replaced the presented one
    pub rotated: Option<IssuedToken>,
}

pub struct RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<U, T> RefreshUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        issuer: Arc<TokenIssuer>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            issuer,
            config,
        }
    }

    pub async fn execute(&self, input: RefreshInput) -> AuthResult<RefreshOutput> {
        let candidate = input
            .body_token
            .or_else(|| input.cookie_token.clone())
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let stored = self
            .token_repo
            .find_by_token(&RefreshToken::digest(&candidate))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let now = Utc::now();
        if stored.revoked || stored.is_expired(now) {
            self.token_repo.delete_by_user(&stored.user_id).await?;
            tracing::info!(user_id = %stored.user_id, "Stale refresh token removed");
            return Err(AuthError::RefreshTokenExpired);
        }

        match input.cookie_token.as_deref() {
            Some(cookie) if constant_time_eq(cookie.as_bytes(), candidate.as_bytes()) => {}
            _ => return Err(AuthError::RefreshTokenMismatch),
        }

        let claims = self
            .issuer
            .validate_refresh_token(&candidate)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        if claims.sub != stored.user_id {
            return Err(AuthError::InvalidRefreshToken);
        }

        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let access = self.issuer.issue_access(&user)?;

        let threshold = Duration::milliseconds(self.config.rotation_threshold_ms());
        if !stored.is_near_expiry(now, threshold) {
            tracing::debug!(user_id = %user.user_id, "Access token refreshed");
            return Ok(RefreshOutput {
                access,
                refresh_token: candidate,
                rotated: None,
            });
        }

        let issued = self.issuer.issue_refresh(
            &user.user_id,
            Duration::milliseconds(self.config.refresh_ttl_ms()),
        )?;
        self.token_repo
            .replace(&RefreshToken::new(
                user.user_id,
                &issued.token,
                issued.expires_at,
            ))
            .await?;

        tracing::info!(user_id = %user.user_id, "Refresh token rotated");

        Ok(RefreshOutput {
            access,
            refresh_token: issued.token.clone(),
            rotated: Some(issued),
        })
    }
}
