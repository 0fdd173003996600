//! In-memory repository
//!
//! Same contracts as the MongoDB implementation, including the unique
//! constraints on email and canonical user name. Clones share state.

use std::collections::HashMap;
use std::sync::Arc;

use kernel::id::UserId;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::{
    otp::Otp, password_reset::PasswordResetToken, refresh_token::RefreshToken, user::User,
};
use crate::domain::repository::{
    OtpRepository, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    /// Keyed by user id, like the `refresh_tokens` collection
    refresh_tokens: HashMap<UserId, RefreshToken>,
    /// Keyed by email
    otps: HashMap<String, Otp>,
    /// Keyed by email
    password_resets: HashMap<String, PasswordResetToken>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored refresh token records
    pub async fn refresh_token_count(&self) -> usize {
        self.state.read().await.refresh_tokens.len()
    }
}

impl UserRepository for InMemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;

        let clash = |other: &User| {
            if other.email == user.email {
                Some(AuthError::EmailTaken)
            } else if other.user_name.canonical() == user.user_name.canonical() {
                Some(AuthError::UserNameTaken)
            } else {
                None
            }
        };
        if let Some(err) = state.users.values().find_map(clash) {
            return Err(err);
        }

        state.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.user_name.canonical() == user_name.canonical())
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        Ok(self.find_by_user_name(user_name).await?.is_some())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&user.user_id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

impl RefreshTokenRepository for InMemoryAuthRepository {
    async fn find_by_token(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        Ok(self
            .state
            .read()
            .await
            .refresh_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> AuthResult<Option<RefreshToken>> {
        Ok(self.state.read().await.refresh_tokens.get(user_id).cloned())
    }

    async fn save(&self, token: &RefreshToken) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.refresh_tokens.contains_key(&token.user_id) {
            return Err(AuthError::Internal(
                "refresh token already stored for user".to_string(),
            ));
        }
        state.refresh_tokens.insert(token.user_id, token.clone());
        Ok(())
    }

    async fn revoke(&self, user_id: &UserId) -> AuthResult<()> {
        if let Some(token) = self.state.write().await.refresh_tokens.get_mut(user_id) {
            token.revoke();
        }
        Ok(())
    }

    async fn replace(&self, token: &RefreshToken) -> AuthResult<()> {
        self.state
            .write()
            .await
            .refresh_tokens
            .insert(token.user_id, token.clone());
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> AuthResult<()> {
        self.state.write().await.refresh_tokens.remove(user_id);
        Ok(())
    }
}

impl OtpRepository for InMemoryAuthRepository {
    async fn find_otp(&self, email: &Email) -> AuthResult<Option<Otp>> {
        Ok(self.state.read().await.otps.get(email.as_str()).cloned())
    }

    async fn insert_otp(&self, otp: &Otp) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.otps.contains_key(otp.email.as_str()) {
            return Err(AuthError::Internal("OTP already stored for email".to_string()));
        }
        state.otps.insert(otp.email.as_str().to_string(), otp.clone());
        Ok(())
    }

    async fn update_otp(&self, otp: &Otp) -> AuthResult<()> {
        self.state
            .write()
            .await
            .otps
            .insert(otp.email.as_str().to_string(), otp.clone());
        Ok(())
    }

    async fn delete_by_id(&self, otp_id: Uuid) -> AuthResult<()> {
        self.state
            .write()
            .await
            .otps
            .retain(|_, otp| otp.otp_id != otp_id);
        Ok(())
    }
}

impl PasswordResetRepository for InMemoryAuthRepository {
    async fn find_reset(&self, email: &Email) -> AuthResult<Option<PasswordResetToken>> {
        Ok(self
            .state
            .read()
            .await
            .password_resets
            .get(email.as_str())
            .cloned())
    }

    async fn insert_reset(&self, token: &PasswordResetToken) -> AuthResult<()> {
        let mut state = self.state.write().await;
        if state.password_resets.contains_key(token.email.as_str()) {
            return Err(AuthError::Internal(
                "reset token already stored for email".to_string(),
            ));
        }
        state
            .password_resets
            .insert(token.email.as_str().to_string(), token.clone());
        Ok(())
    }

    async fn update_reset(&self, token: &PasswordResetToken) -> AuthResult<()> {
        self.state
            .write()
            .await
            .password_resets
            .insert(token.email.as_str().to_string(), token.clone());
        Ok(())
    }

    async fn delete_reset(&self, email: &Email) -> AuthResult<()> {
        self.state.write().await.password_resets.remove(email.as_str());
        Ok(())
    }
}
