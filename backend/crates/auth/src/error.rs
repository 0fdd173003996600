//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::mongo_error_kind, kind::ErrorKind};
use platform::deadline::DeadlineExceeded;
use thiserror::Error;

use crate::domain::value_object::user_name::UserNameError;
use crate::domain::value_object::user_role::RoleChangeError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Username already exists")]
    UserNameTaken,

    #[error("Email already registered")]
    EmailTaken,

    /// Same message for unknown identifier and wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    MissingAccessToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Refresh token missing")]
    MissingRefreshToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired or revoked")]
    RefreshTokenExpired,

    #[error("Refresh token does not match session cookie")]
    RefreshTokenMismatch,

    #[error("Email already verified")]
    AlreadyVerified,

    #[error("OTP still valid")]
    OtpStillValid,

    #[error("Maximum OTP attempts reached, try again later")]
    OtpMaxAttempts,

    #[error("OTP not found")]
    OtpNotFound,

    #[error("OTP expired")]
    OtpExpired,

    #[error("Invalid OTP code")]
    InvalidOtp,

    #[error("A password reset link was already sent")]
    ResetTokenActive,

    #[error("Daily password reset limit reached")]
    ResetLimitReached,

    #[error("Invalid or expired reset token")]
    ResetTokenInvalidOrExpired,

    #[error("Invalid reset token")]
    ResetTokenMismatch,

    #[error("Current password is incorrect")]
    WrongCurrentPassword,

    #[error(transparent)]
    RoleChange(#[from] RoleChangeError),

    /// Value object validation or other failure that already carries a kind
    #[error("{0}")]
    App(#[from] AppError),

    #[error("Request timed out")]
    Timeout(#[from] DeadlineExceeded),

    #[error("Email delivery failed: {0}")]
    Mail(String),

    #[error("Image upload failed: {0}")]
    ImageHost(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound | AuthError::OtpNotFound => ErrorKind::NotFound,
            AuthError::UserNameTaken | AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::MissingAccessToken
            | AuthError::TokenExpired
            | AuthError::TokenInvalid
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken
            | AuthError::RefreshTokenExpired
            | AuthError::RefreshTokenMismatch
            | AuthError::OtpExpired
            | AuthError::InvalidOtp
            | AuthError::WrongCurrentPassword => ErrorKind::Unauthorized,
            AuthError::AlreadyVerified
            | AuthError::ResetTokenInvalidOrExpired
            | AuthError::ResetTokenMismatch => ErrorKind::BadRequest,
            AuthError::OtpStillValid
            | AuthError::OtpMaxAttempts
            | AuthError::ResetTokenActive
            | AuthError::ResetLimitReached => ErrorKind::TooManyRequests,
            AuthError::RoleChange(RoleChangeError::NoChange) => ErrorKind::BadRequest,
            AuthError::RoleChange(_) => ErrorKind::Forbidden,
            AuthError::App(err) => err.kind(),
            AuthError::Timeout(_) => ErrorKind::RequestTimeout,
            AuthError::Mail(_) | AuthError::ImageHost(_) => ErrorKind::BadGateway,
            AuthError::Database(err) => mongo_error_kind(err).0,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::App(err) => {
                let app = AppError::new(err.kind(), err.message().to_string());
                match err.action() {
                    Some(action) => app.with_action(action.to_string()),
                    None => app,
                }
            }
            // Driver details stay in the logs
            AuthError::Database(err) => AppError::new(self.kind(), mongo_error_kind(err).1),
            AuthError::Internal(_) => AppError::internal("Internal server error"),
            AuthError::OtpStillValid => AppError::too_many_requests(self.to_string())
                .with_action("Use the code already sent or wait for it to expire"),
            AuthError::ResetTokenActive => AppError::too_many_requests(self.to_string())
                .with_action("Check your inbox or wait for the link to expire"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Mail(msg) | AuthError::ImageHost(msg) => {
                tracing::error!(message = %msg, "Auth provider error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RefreshTokenExpired
            | AuthError::RefreshTokenMismatch
            | AuthError::InvalidRefreshToken => {
                tracing::warn!(error = %self, "Refresh rejected");
            }
            AuthError::RoleChange(reason) => {
                tracing::warn!(reason = %reason, "Role change denied");
            }
            AuthError::App(err) if err.is_server_error() => {
                tracing::error!(error = %err, "Auth error");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::mail::MailError> for AuthError {
    fn from(err: platform::mail::MailError) -> Self {
        AuthError::Mail(err.to_string())
    }
}

impl From<UserNameError> for AuthError {
    fn from(err: UserNameError) -> Self {
        AuthError::App(
            AppError::bad_request(err.to_string())
                .with_action("Use 3-30 letters, digits, '_', '.' or '-'"),
        )
    }
}

impl From<platform::password::PasswordHashError> for AuthError {
    fn from(err: platform::password::PasswordHashError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::image::ImageError> for AuthError {
    fn from(err: platform::image::ImageError) -> Self {
        if err.is_client_error() {
            AuthError::App(AppError::bad_request(err.to_string()))
        } else {
            AuthError::ImageHost(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::OtpStillValid.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::EmailTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::RoleChange(RoleChangeError::NoChange).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::RoleChange(RoleChangeError::AssignSuperAdmin).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::Timeout(DeadlineExceeded(std::time::Duration::from_secs(5))).status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
    }

    #[test]
    fn test_app_error_passthrough_keeps_kind_and_action() {
        let err: AuthError = AppError::bad_request("Invalid email format")
            .with_action("Fix it")
            .into();
        let app = err.to_app_error();
        assert_eq!(app.kind(), ErrorKind::BadRequest);
        assert_eq!(app.message(), "Invalid email format");
        assert_eq!(app.action(), Some("Fix it"));
    }

    #[test]
    fn test_internal_message_is_hidden() {
        let app = AuthError::Internal("jwt key parse".to_string()).to_app_error();
        assert_eq!(app.message(), "Internal server error");
    }
}
