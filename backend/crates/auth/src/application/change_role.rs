//! Change Role Use Case

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::{RoleChangeError, UserRole};
use crate::error::{AuthError, AuthResult};

pub struct ChangeRoleInput {
    pub initiator_id: UserId,
    pub initiator_role: UserRole,
    pub target_id: UserId,
    pub new_role: UserRole,
}

pub struct ChangeRoleUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> ChangeRoleUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(&self, input: ChangeRoleInput) -> AuthResult<User> {
        // Non-admins learn nothing about the target
        if !input.initiator_role.is_admin_or_higher() {
            return Err(RoleChangeError::NotAnAdmin.into());
        }

        let mut user = self
            .user_repo
            .find_by_id(&input.target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        UserRole::authorize_change(input.initiator_role, user.user_role, input.new_role)?;

        let previous = user.user_role;
        user.set_role(input.new_role);
        self.user_repo.update(&user).await?;

        tracing::info!(
            initiator_id = %input.initiator_id,
            target_id = %user.user_id,
            from = %previous,
            to = %input.new_role,
            "User role changed"
        );

        Ok(user)
    }
}
