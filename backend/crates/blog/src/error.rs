//! Blog Error Types
//!
//! Blog-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, conversions::mongo_error_kind, kind::ErrorKind};
use platform::deadline::DeadlineExceeded;
use platform::genai::GenAiError;
use thiserror::Error;

pub type BlogResult<T> = Result<T, BlogError>;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("Blog post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Only the author or an admin can modify this {0}")]
    NotAuthor(&'static str),

    #[error("Reaction not found")]
    ReactionNotFound,

    /// Validation failures and other errors that already carry a kind
    #[error("{0}")]
    App(#[from] AppError),

    #[error("Request timed out")]
    Timeout(#[from] DeadlineExceeded),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Stored document is malformed: {0}")]
    Malformed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BlogError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BlogError::PostNotFound | BlogError::CommentNotFound | BlogError::ReactionNotFound => {
                ErrorKind::NotFound
            }
            BlogError::NotAuthor(_) => ErrorKind::Forbidden,
            BlogError::App(err) => err.kind(),
            BlogError::Timeout(_) => ErrorKind::RequestTimeout,
            BlogError::Generation(_) => ErrorKind::BadGateway,
            BlogError::Database(err) => mongo_error_kind(err).0,
            BlogError::Malformed(_) | BlogError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        match self {
            BlogError::App(err) => {
                let app = AppError::new(err.kind(), err.message().to_string());
                match err.action() {
                    Some(action) => app.with_action(action.to_string()),
                    None => app,
                }
            }
            BlogError::Database(err) => AppError::new(self.kind(), mongo_error_kind(err).1),
            BlogError::Malformed(_) | BlogError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            BlogError::Generation(_) => AppError::bad_gateway("Text generation failed")
                .with_action("Try again in a moment"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            BlogError::Database(e) => {
                tracing::error!(error = %e, "Blog database error");
            }
            BlogError::Malformed(msg) | BlogError::Internal(msg) => {
                tracing::error!(message = %msg, "Blog internal error");
            }
            BlogError::Generation(msg) => {
                tracing::error!(message = %msg, "Text generation provider error");
            }
            BlogError::NotAuthor(what) => {
                tracing::warn!(target_kind = what, "Modification denied");
            }
            BlogError::App(err) if err.is_server_error() => {
                tracing::error!(error = %err, "Blog error");
            }
            _ => {
                tracing::debug!(error = %self, "Blog error");
            }
        }
    }
}

impl IntoResponse for BlogError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<GenAiError> for BlogError {
    fn from(err: GenAiError) -> Self {
        BlogError::Generation(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for BlogError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        BlogError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(BlogError::PostNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BlogError::NotAuthor("post").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            BlogError::Generation("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            BlogError::App(AppError::bad_request("Title cannot be empty")).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let app = BlogError::Malformed("missing field `title`".into()).to_app_error();
        assert_eq!(app.message(), "Internal server error");
    }

    #[test]
    fn test_not_author_message() {
        assert_eq!(
            BlogError::NotAuthor("comment").to_string(),
            "Only the author or an admin can modify this comment"
        );
    }
}
