//! Post title value object

use kernel::error::app_error::{AppError, AppResult};

pub const TITLE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn new(title: impl Into<String>) -> AppResult<Self> {
        let title = title.into().trim().to_string();

        if title.is_empty() {
            return Err(AppError::bad_request("Title cannot be empty"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(AppError::bad_request(format!(
                "Title must be at most {TITLE_MAX_CHARS} characters"
            )));
        }

        Ok(Self(title))
    }

    /// Stored values were validated on the way in
    pub fn from_db(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Title {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
