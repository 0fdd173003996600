//! Register Use Case
//!
//! Creates a new, unverified user account.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct RegisterInput {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub user: User,
}

pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let user_name = UserName::new(input.user_name)?;
        let email = Email::new(input.email)?;
        let raw_password = RawPassword::new(input.password)?;

        if self.user_repo.exists_by_user_name(&user_name).await? {
            return Err(AuthError::UserNameTaken);
        }
        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let user = User::new(user_name, email, password_hash);

        // The unique indexes still catch a concurrent registration
        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            "User registered"
        );

        Ok(RegisterOutput { user })
    }
}
