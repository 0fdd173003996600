//! Login Use Case
//!
//! Verifies credentials, issues a token pair and leaves exactly one
//! refresh token record for the user.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::{TokenIssuer, TokenPair};
use crate::domain::entity::{refresh_token::RefreshToken, user::User};
use crate::domain::repository::{RefreshTokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_name::UserName, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct LoginInput {
    /// User name or email
    pub identifier: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct LoginUseCase<U, T>
where
    U: UserRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    issuer: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<U, T> LoginUseCase<U, T>
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

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let user = self
            .verify_credentials(&input.identifier, input.password)
            .await?;

        let tokens = self.issuer.generate_tokens(&user)?;
        let record = RefreshToken::new(
            user.user_id,
            &tokens.refresh.token,
            tokens.refresh.expires_at,
        );

        match self.token_repo.find_by_user(&user.user_id).await? {
            Some(_) => {
                self.token_repo.revoke(&user.user_id).await?;
                self.token_repo.replace(&record).await?;
            }
            None => self.token_repo.save(&record).await?,
        }

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(LoginOutput { user, tokens })
    }

    /// Unknown identifier and wrong password fail identically
    pub async fn verify_credentials(&self, identifier: &str, password: String) -> AuthResult<User> {
        let identifier = identifier.trim();

        let user = if identifier.contains('@') {
            let email = Email::new(identifier).map_err(|_| AuthError::InvalidCredentials)?;
            self.user_repo.find_by_email(&email).await?
        } else {
            let user_name = UserName::new(identifier).map_err(|_| AuthError::InvalidCredentials)?;
            self.user_repo.find_by_user_name(&user_name).await?
        };
        let user = user.ok_or(AuthError::InvalidCredentials)?;

        let candidate = RawPassword::for_verification(password);
        if !user.password_hash.verify(&candidate, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}
