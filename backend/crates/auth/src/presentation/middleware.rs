//! Auth Middleware
//!
//! Access-token guard for protected routes. The token is read from the
//! `Authorization: Bearer` header first, then from the access cookie.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use kernel::id::UserId;
use platform::cookie::{extract_bearer, extract_cookie};

use crate::application::config::ACCESS_COOKIE_NAME;
use crate::application::token::{AccessClaims, TokenIssuer};
use crate::domain::value_object::user_role::{RoleChangeError, UserRole};
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AccessGuard {
    issuer: Arc<TokenIssuer>,
}

impl AccessGuard {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

/// Identity of the caller, taken from a validated access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin_or_higher()
    }
}

impl From<AccessClaims> for AuthenticatedUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Middleware that requires a valid access token
pub async fn require_access_token(
    State(guard): State<AccessGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let headers = req.headers();
    let token = extract_bearer(headers)
        .or_else(|| extract_cookie(headers, ACCESS_COOKIE_NAME))
        .ok_or(AuthError::MissingAccessToken)?;

    let claims = guard.issuer.validate_access_token(&token)?;
    req.extensions_mut().insert(AuthenticatedUser::from(claims));

    Ok(next.run(req).await)
}

/// Middleware that requires an admin or superadmin caller.
/// Must run after [`require_access_token`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or(AuthError::MissingAccessToken)?;

    if !user.is_admin() {
        return Err(RoleChangeError::NotAnAdmin.into());
    }

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingAccessToken)
    }
}
