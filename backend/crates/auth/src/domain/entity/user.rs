//! User Entity

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{
    email::Email, user_name::UserName, user_password::UserPassword, user_role::UserRole,
};

/// Optional public profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// A registered account. Users are never hard-deleted.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub user_name: UserName,
    pub email: Email,
    pub password_hash: UserPassword,
    pub user_role: UserRole,
    pub profile: Profile,
    /// Set once the email OTP has been confirmed
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(user_name: UserName, email: Email, password_hash: UserPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            user_name,
            email,
            password_hash,
            user_role: UserRole::default(),
            profile: Profile::default(),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.user_role = role;
        self.touch();
    }

    pub fn set_password(&mut self, password_hash: UserPassword) {
        self.password_hash = password_hash;
        self.touch();
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = profile;
        self.touch();
    }

    pub fn set_avatar(&mut self, url: String) {
        self.profile.avatar_url = Some(url);
        self.touch();
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
