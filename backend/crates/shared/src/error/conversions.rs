//! Error conversions - From implementations for common error types
//!
//! Provides automatic conversion from common error types to [`AppError`].

use super::app_error::AppError;
use super::kind::ErrorKind;

// ============================================================================
// Standard library conversions
// ============================================================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::Forbidden,
            std::io::ErrorKind::TimedOut => ErrorKind::RequestTimeout,
            _ => ErrorKind::InternalServerError,
        };
        AppError::new(kind, "I/O operation failed").with_source(err)
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::bad_request("Invalid integer format").with_source(err)
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::bad_request("Invalid identifier").with_source(err)
    }
}

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() {
            AppError::bad_request(format!("JSON parse error: {}", err)).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

// ============================================================================
// MongoDB conversions (feature-gated)
// ============================================================================

/// Server error code for unique index violations
#[cfg(feature = "mongodb")]
pub const MONGO_DUPLICATE_KEY: i32 = 11000;

/// Whether a driver error is a unique index violation
#[cfg(feature = "mongodb")]
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind as MongoKind, WriteFailure};

    match err.kind.as_ref() {
        MongoKind::Write(WriteFailure::WriteError(write_err)) => {
            write_err.code == MONGO_DUPLICATE_KEY
        }
        MongoKind::Command(cmd) => cmd.code == MONGO_DUPLICATE_KEY,
        _ => false,
    }
}

/// Classify a driver error
#[cfg(feature = "mongodb")]
pub fn mongo_error_kind(err: &mongodb::error::Error) -> (ErrorKind, &'static str) {
    use mongodb::error::ErrorKind as MongoKind;

    if is_duplicate_key(err) {
        return (ErrorKind::Conflict, "Duplicate key value");
    }
    match err.kind.as_ref() {
        MongoKind::ServerSelection { .. } | MongoKind::Io(_) => {
            (ErrorKind::ServiceUnavailable, "Database unavailable")
        }
        MongoKind::BsonDeserialization(_) | MongoKind::BsonSerialization(_) => {
            (ErrorKind::InternalServerError, "Document mapping error")
        }
        _ => (ErrorKind::InternalServerError, "Database error"),
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        let (kind, message) = mongo_error_kind(&err);
        AppError::new(kind, message).with_source(err)
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::RequestTimeout);

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let app_err: AppError = io_err.into();
        assert_eq!(app_err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_uuid_error_conversion() {
        let err = uuid::Uuid::parse_str("nope").unwrap_err();
        let app_err: AppError = err.into();
        assert_eq!(app_err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert_eq!(app_err.kind(), ErrorKind::BadRequest);
    }
}
