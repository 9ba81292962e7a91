use std::fmt;

use crate::{domain::UserId, errors::Error, Result};

pub const EMPTY_TEXT_MESSAGE: &str = "Task text must not be empty";

/// One stored to-do item.
///
/// Values are produced by [`crate::store::TaskStore`]; `id` and `created_at`
/// are assigned at insert time and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    id: i64,
    text: String,
    user_id: UserId,
    created_at: String,
}

impl Task {
    pub fn new(id: i64, text: String, user_id: UserId, created_at: String) -> Self {
        Self {
            id,
            text,
            user_id,
            created_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// ISO-8601 creation timestamp (local wall clock).
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Replace the text of this in-memory value.
    ///
    /// Nothing is written to storage; the bot itself never edits tasks.
    pub fn set_text(&mut self, new_text: &str) -> Result<()> {
        self.text = normalize_text(new_text)?;
        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task #{}: '{}' (user: {}, created: {})",
            self.id, self.text, self.user_id, self.created_at
        )
    }
}

/// Trim task text and reject it if nothing is left.
pub fn normalize_text(text: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(EMPTY_TEXT_MESSAGE.to_string()));
    }
    Ok(trimmed.to_string())
}
