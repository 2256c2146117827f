// src/models/question_set.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Visibility state of a question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetPrivacy {
    Private,
    Protected,
    Pending,
    Approved,
    Rejected,
}

impl SetPrivacy {
    pub fn as_str(self) -> &'static str {
        match self {
            SetPrivacy::Private => "private",
            SetPrivacy::Protected => "protected",
            SetPrivacy::Pending => "pending",
            SetPrivacy::Approved => "approved",
            SetPrivacy::Rejected => "rejected",
        }
    }
}

/// Represents the 'question_sets' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionSetRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub privacy: String,
    pub author: Option<Uuid>,
    pub license: Option<String>,
    pub is_archived: bool,
    /// Solo practice session bound to the current question ordering.
    /// Cleared whenever the ordering changes.
    pub solo_session_id: Option<Uuid>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a question set.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionSetRequest {
    #[validate(length(
        min = 1,
        max = 300,
        message = "Title length must be between 1 and 300 characters."
    ))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description is too long."))]
    pub description: Option<String>,
    pub privacy: Option<SetPrivacy>,
    pub author: Option<Uuid>,
    pub license: Option<String>,
}

/// DTO for persisting a new question ordering within a set.
/// Must list every question of the set exactly once.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub questions: Vec<Uuid>,
}
