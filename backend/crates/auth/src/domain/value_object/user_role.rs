use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

impl UserRole {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use UserRole::*;
        match self {
            User => "user",
            Admin => "admin",
            SuperAdmin => "superadmin",
        }
    }

    #[inline]
    pub const fn is_admin_or_higher(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::SuperAdmin)
    }

    #[inline]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self, UserRole::SuperAdmin)
    }

    /// Whether `initiator` may move a user from `current` to `requested`.
    ///
    /// Rules are checked in order and the first failure wins.
    pub fn authorize_change(
        initiator: UserRole,
        current: UserRole,
        requested: UserRole,
    ) -> Result<(), RoleChangeError> {
        use UserRole::*;

        if !initiator.is_admin_or_higher() {
            return Err(RoleChangeError::NotAnAdmin);
        }
        if requested == SuperAdmin && initiator != SuperAdmin {
            return Err(RoleChangeError::AssignSuperAdmin);
        }
        if current == SuperAdmin && initiator != SuperAdmin {
            return Err(RoleChangeError::ModifySuperAdmin);
        }
        if current == Admin && initiator == Admin {
            return Err(RoleChangeError::ModifyPeerAdmin);
        }
        if current == requested {
            return Err(RoleChangeError::NoChange);
        }
        Ok(())
    }
}

/// Reasons a role change is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoleChangeError {
    #[error("Only admins can change user roles")]
    NotAnAdmin,
    #[error("Only a superadmin can assign the superadmin role")]
    AssignSuperAdmin,
    #[error("Only a superadmin can modify a superadmin")]
    ModifySuperAdmin,
    #[error("Admins cannot modify other admins")]
    ModifyPeerAdmin,
    #[error("No change in role")]
    NoChange,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            "superadmin" => Ok(UserRole::SuperAdmin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}
