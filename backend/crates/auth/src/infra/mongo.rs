//! MongoDB Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use mongodb::bson::{self, doc};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{
    otp::Otp,
    password_reset::PasswordResetToken,
    refresh_token::RefreshToken,
    user::{Profile, User},
};
use crate::domain::repository::{
    OtpRepository, PasswordResetRepository, RefreshTokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email, user_name::UserName, user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const USERS: &str = "users";
const REFRESH_TOKENS: &str = "refresh_tokens";
const OTPS: &str = "otps";
const PASSWORD_RESETS: &str = "password_resets";

/// MongoDB-backed auth repository
#[derive(Clone)]
pub struct MongoAuthRepository {
    db: Database,
}

impl MongoAuthRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection(USERS)
    }

    fn refresh_tokens(&self) -> Collection<RefreshTokenDocument> {
        self.db.collection(REFRESH_TOKENS)
    }

    fn otps(&self) -> Collection<OtpDocument> {
        self.db.collection(OTPS)
    }

    fn password_resets(&self) -> Collection<PasswordResetDocument> {
        self.db.collection(PASSWORD_RESETS)
    }

    /// Create the unique and lookup indexes the repositories rely on
    pub async fn ensure_indexes(&self) -> AuthResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username_canonical": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.users()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.refresh_tokens()
            .create_index(IndexModel::builder().keys(doc! { "token_hash": 1 }).build())
            .await?;
        self.otps()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;
        self.password_resets()
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
            )
            .await?;

        tracing::info!("Auth indexes ensured");
        Ok(())
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for MongoAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.users()
            .insert_one(UserDocument::from_user(user))
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        self.users()
            .find_one(doc! { "_id": user_id.to_string() })
            .await?
            .map(UserDocument::into_user)
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.users()
            .find_one(doc! { "email": email.as_str() })
            .await?
            .map(UserDocument::into_user)
            .transpose()
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AuthResult<Option<User>> {
        self.users()
            .find_one(doc! { "username_canonical": user_name.canonical() })
            .await?
            .map(UserDocument::into_user)
            .transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let count = self
            .users()
            .count_documents(doc! { "email": email.as_str() })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AuthResult<bool> {
        let count = self
            .users()
            .count_documents(doc! { "username_canonical": user_name.canonical() })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let result = self
            .users()
            .replace_one(
                doc! { "_id": user.user_id.to_string() },
                UserDocument::from_user(user),
            )
            .await?;

        if result.matched_count == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}

// ============================================================================
// Refresh Token Repository Implementation
// ============================================================================

impl RefreshTokenRepository for MongoAuthRepository {
    async fn find_by_token(&self, token_hash: &str) -> AuthResult<Option<RefreshToken>> {
        self.refresh_tokens()
            .find_one(doc! { "token_hash": token_hash })
            .await?
            .map(RefreshTokenDocument::into_token)
            .transpose()
    }

    async fn find_by_user(&self, user_id: &UserId) -> AuthResult<Option<RefreshToken>> {
        self.refresh_tokens()
            .find_one(doc! { "_id": user_id.to_string() })
            .await?
            .map(RefreshTokenDocument::into_token)
            .transpose()
    }

    async fn save(&self, token: &RefreshToken) -> AuthResult<()> {
        self.refresh_tokens()
            .insert_one(RefreshTokenDocument::from_token(token))
            .await?;
        Ok(())
    }

    async fn revoke(&self, user_id: &UserId) -> AuthResult<()> {
        self.refresh_tokens()
            .update_one(
                doc! { "_id": user_id.to_string() },
                doc! { "$set": { "revoked": true } },
            )
            .await?;
        Ok(())
    }

    async fn replace(&self, token: &RefreshToken) -> AuthResult<()> {
        self.refresh_tokens()
            .replace_one(
                doc! { "_id": token.user_id.to_string() },
                RefreshTokenDocument::from_token(token),
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_by_user(&self, user_id: &UserId) -> AuthResult<()> {
        self.refresh_tokens()
            .delete_many(doc! { "_id": user_id.to_string() })
            .await?;
        Ok(())
    }
}

// ============================================================================
// OTP Repository Implementation
// ============================================================================

impl OtpRepository for MongoAuthRepository {
    async fn find_otp(&self, email: &Email) -> AuthResult<Option<Otp>> {
        self.otps()
            .find_one(doc! { "email": email.as_str() })
            .await?
            .map(OtpDocument::into_otp)
            .transpose()
    }

    async fn insert_otp(&self, otp: &Otp) -> AuthResult<()> {
        self.otps().insert_one(OtpDocument::from_otp(otp)).await?;
        Ok(())
    }

    async fn update_otp(&self, otp: &Otp) -> AuthResult<()> {
        self.otps()
            .replace_one(
                doc! { "_id": otp.otp_id.to_string() },
                OtpDocument::from_otp(otp),
            )
            .await?;
        Ok(())
    }

    async fn delete_by_id(&self, otp_id: Uuid) -> AuthResult<()> {
        self.otps()
            .delete_one(doc! { "_id": otp_id.to_string() })
            .await?;
        Ok(())
    }
}

// ============================================================================
// Password Reset Repository Implementation
// ============================================================================

impl PasswordResetRepository for MongoAuthRepository {
    async fn find_reset(&self, email: &Email) -> AuthResult<Option<PasswordResetToken>> {
        self.password_resets()
            .find_one(doc! { "email": email.as_str() })
            .await?
            .map(PasswordResetDocument::into_token)
            .transpose()
    }

    async fn insert_reset(&self, token: &PasswordResetToken) -> AuthResult<()> {
        self.password_resets()
            .insert_one(PasswordResetDocument::from_token(token))
            .await?;
        Ok(())
    }

    async fn update_reset(&self, token: &PasswordResetToken) -> AuthResult<()> {
        self.password_resets()
            .replace_one(
                doc! { "email": token.email.as_str() },
                PasswordResetDocument::from_token(token),
            )
            .await?;
        Ok(())
    }

    async fn delete_reset(&self, email: &Email) -> AuthResult<()> {
        self.password_resets()
            .delete_one(doc! { "email": email.as_str() })
            .await?;
        Ok(())
    }
}

// ============================================================================
// Documents
// ============================================================================

fn to_bson(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn from_bson(at: bson::DateTime) -> AuthResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis())
        .ok_or_else(|| AuthError::Internal("Stored timestamp out of range".to_string()))
}

fn parse_uuid(raw: &str) -> AuthResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AuthError::Internal(format!("Invalid stored id: {e}")))
}

fn to_count(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    username_canonical: String,
    email: String,
    password_hash: String,
    role: UserRole,
    name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    verified: bool,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl UserDocument {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            username: user.user_name.original().to_string(),
            username_canonical: user.user_name.canonical().to_string(),
            email: user.email.as_str().to_string(),
            password_hash: user.password_hash.as_phc_string().to_string(),
            role: user.user_role,
            name: user.profile.name.clone(),
            bio: user.profile.bio.clone(),
            avatar_url: user.profile.avatar_url.clone(),
            verified: user.verified,
            created_at: to_bson(user.created_at),
            updated_at: to_bson(user.updated_at),
        }
    }

    fn into_user(self) -> AuthResult<User> {
        Ok(User {
            user_id: UserId::from_uuid(parse_uuid(&self.id)?),
            user_name: UserName::from_db(&self.username),
            email: Email::from_db(self.email),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            user_role: self.role,
            profile: Profile {
                name: self.name,
                bio: self.bio,
                avatar_url: self.avatar_url,
            },
            verified: self.verified,
            created_at: from_bson(self.created_at)?,
            updated_at: from_bson(self.updated_at)?,
        })
    }
}

/// Keyed by user id, so `replace` converges to one record per user
#[derive(Debug, Serialize, Deserialize)]
struct RefreshTokenDocument {
    #[serde(rename = "_id")]
    user_id: String,
    token_hash: String,
    revoked: bool,
    expires_at: bson::DateTime,
    created_at: bson::DateTime,
}

impl RefreshTokenDocument {
    fn from_token(token: &RefreshToken) -> Self {
        Self {
            user_id: token.user_id.to_string(),
            token_hash: token.token_hash.clone(),
            revoked: token.revoked,
            expires_at: to_bson(token.expires_at),
            created_at: to_bson(token.created_at),
        }
    }

    fn into_token(self) -> AuthResult<RefreshToken> {
        Ok(RefreshToken {
            user_id: UserId::from_uuid(parse_uuid(&self.user_id)?),
            token_hash: self.token_hash,
            revoked: self.revoked,
            expires_at: from_bson(self.expires_at)?,
            created_at: from_bson(self.created_at)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OtpDocument {
    #[serde(rename = "_id")]
    id: String,
    email: String,
    code_hash: String,
    expires_at: bson::DateTime,
    attempts: i64,
    created_at: bson::DateTime,
}

impl OtpDocument {
    fn from_otp(otp: &Otp) -> Self {
        Self {
            id: otp.otp_id.to_string(),
            email: otp.email.as_str().to_string(),
            code_hash: otp.code_hash.clone(),
            expires_at: to_bson(otp.expires_at),
            attempts: i64::from(otp.attempts),
            created_at: to_bson(otp.created_at),
        }
    }

    fn into_otp(self) -> AuthResult<Otp> {
        Ok(Otp {
            otp_id: parse_uuid(&self.id)?,
            email: Email::from_db(self.email),
            code_hash: self.code_hash,
            expires_at: from_bson(self.expires_at)?,
            attempts: to_count(self.attempts),
            created_at: from_bson(self.created_at)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PasswordResetDocument {
    email: String,
    token_hash: String,
    expires_at: bson::DateTime,
    used: bool,
    request_count: i64,
    created_at: bson::DateTime,
}

impl PasswordResetDocument {
    fn from_token(token: &PasswordResetToken) -> Self {
        Self {
            email: token.email.as_str().to_string(),
            token_hash: token.token_hash.clone(),
            expires_at: to_bson(token.expires_at),
            used: token.used,
            request_count: i64::from(token.request_count),
            created_at: to_bson(token.created_at),
        }
    }

    fn into_token(self) -> AuthResult<PasswordResetToken> {
        Ok(PasswordResetToken {
            email: Email::from_db(self.email),
            token_hash: self.token_hash,
            expires_at: from_bson(self.expires_at)?,
            used: self.used,
            request_count: to_count(self.request_count),
            created_at: from_bson(self.created_at)?,
        })
    }
}
