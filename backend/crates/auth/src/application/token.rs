//! Token Issuer
//!
//! Mints and validates HS256 access/refresh token pairs. Each kind is signed
//! with its own secret, so a refresh token never validates as an access token.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{AuthError, AuthResult};

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: UserId,
    pub role: UserRole,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: UserId,
    /// Makes two tokens minted in the same second distinct
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<AuthConfig>,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(&config.access_secret),
            access_decoding: DecodingKey::from_secret(&config.access_secret),
            refresh_encoding: EncodingKey::from_secret(&config.refresh_secret),
            refresh_decoding: DecodingKey::from_secret(&config.refresh_secret),
            validation,
            config,
        }
    }

    /// Fresh access and refresh tokens for `user`
    pub fn generate_tokens(&self, user: &User) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access: self.issue_access(user)?,
            refresh: self.issue_refresh(
                &user.user_id,
                Duration::milliseconds(self.config.refresh_ttl_ms()),
            )?,
        })
    }

    pub fn issue_access(&self, user: &User) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + Duration::milliseconds(self.config.access_ttl_ms());
        let claims = AccessClaims {
            sub: user.user_id,
            role: user.user_role,
            username: user.user_name.original().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AuthError::Internal(format!("access token signing: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: truncate_to_secs(expires_at),
        })
    }

    /// Refresh token for `user_id` living for `ttl`
    pub fn issue_refresh(&self, user_id: &UserId, ttl: Duration) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let claims = RefreshClaims {
            sub: *user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AuthError::Internal(format!("refresh token signing: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: truncate_to_secs(expires_at),
        })
    }

    pub fn validate_access_token(&self, token: &str) -> AuthResult<AccessClaims> {
        decode::<AccessClaims>(token, &self.access_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }

    pub fn validate_refresh_token(&self, token: &str) -> AuthResult<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => {
            tracing::debug!(error = %err, "Token rejected");
            AuthError::TokenInvalid
        }
    }
}

/// Tokens carry whole seconds; keep the stored expiry in step with `exp`
fn truncate_to_secs(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(at.timestamp(), 0).single().unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{
        email::Email,
        user_name::UserName,
        user_password::{RawPassword, UserPassword},
    };

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(Arc::new(AuthConfig::development()))
    }

    fn user() -> User {
        let raw = RawPassword::new("correct horse battery".to_string()).unwrap();
        User::new(
            UserName::new("alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        )
    }

    #[test]
    fn test_access_token_carries_identity() {
        let issuer = issuer();
        let user = user();
        let pair = issuer.generate_tokens(&user).unwrap();

        let claims = issuer.validate_access_token(&pair.access.token).unwrap();
        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.username, "alice");

        let refresh = issuer.validate_refresh_token(&pair.refresh.token).unwrap();
        assert_eq!(refresh.sub, user.user_id);
        assert!(pair.refresh.expires_at > pair.access.expires_at);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.generate_tokens(&user()).unwrap();

        assert!(matches!(
            issuer.validate_access_token(&pair.refresh.token),
            Err(AuthError::TokenInvalid)
        ));
        assert!(matches!(
            issuer.validate_refresh_token(&pair.access.token),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_expired_refresh_token() {
        let issuer = issuer();
        let issued = issuer
            .issue_refresh(&UserId::new(), Duration::seconds(-10))
            .unwrap();

        assert!(matches!(
            issuer.validate_refresh_token(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let issuer = issuer();
        let user_id = UserId::new();
        let a = issuer.issue_refresh(&user_id, Duration::hours(1)).unwrap();
        let b = issuer.issue_refresh(&user_id, Duration::hours(1)).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_garbage_is_invalid() {
        assert!(matches!(
            issuer().validate_access_token("not-a-jwt"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
