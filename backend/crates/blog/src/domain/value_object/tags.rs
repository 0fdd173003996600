//! Tag set value object
//!
//! Tags are lowercased, trimmed, deduplicated and kept in sorted order so
//! equal sets compare and hash equally.

use std::collections::BTreeSet;

use kernel::error::app_error::{AppError, AppResult};

pub const MAX_TAGS: usize = 10;
pub const TAG_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags(Vec<String>);

impl Tags {
    pub fn new<I, S>(tags: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized: BTreeSet<String> = tags
            .into_iter()
            .map(|tag| normalize(tag.as_ref()))
            .filter(|tag| !tag.is_empty())
            .collect();

        if normalized.len() > MAX_TAGS {
            return Err(AppError::bad_request(format!("At most {MAX_TAGS} tags are allowed")));
        }
        if let Some(long) = normalized.iter().find(|t| t.chars().count() > TAG_MAX_CHARS) {
            return Err(AppError::bad_request(format!(
                "Tag '{long}' is longer than {TAG_MAX_CHARS} characters"
            )));
        }

        Ok(Self(normalized.into_iter().collect()))
    }

    /// Comma-separated list, as sent in query strings
    pub fn parse_csv(raw: &str) -> AppResult<Self> {
        Self::new(raw.split(','))
    }

    pub fn from_db(tags: Vec<String>) -> Self {
        Self(tags)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if any tag is shared
    pub fn intersects(&self, other: &Tags) -> bool {
        self.0.iter().any(|tag| other.0.contains(tag))
    }
}

fn normalize(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}
