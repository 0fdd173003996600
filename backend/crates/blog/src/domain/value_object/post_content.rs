//! Post and comment bodies

use kernel::error::app_error::{AppError, AppResult};

pub const POST_CONTENT_MAX_CHARS: usize = 50_000;
pub const COMMENT_MAX_CHARS: usize = 2_000;

/// Markdown body of a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent(String);

impl PostContent {
    pub fn new(content: impl Into<String>) -> AppResult<Self> {
        bounded_text(content.into(), "Content", POST_CONTENT_MAX_CHARS).map(Self)
    }

    pub fn from_db(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plain-text body of a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentText(String);

impl CommentText {
    pub fn new(text: impl Into<String>) -> AppResult<Self> {
        bounded_text(text.into(), "Comment", COMMENT_MAX_CHARS).map(Self)
    }

    pub fn from_db(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn bounded_text(text: String, field: &str, max_chars: usize) -> AppResult<String> {
    if text.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} cannot be empty")));
    }
    if text.chars().count() > max_chars {
        return Err(AppError::bad_request(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(text)
}
