// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// The fixed set of question kinds. Each kind governs which sub-structure
/// of the payload is required at save time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Boolean,
    SingleChoice,
    MultipleChoice,
    FreeText,
    Categorizer,
    MultipleCategorizer,
    Sorter,
    Cloze,
    Hotspot,
    Gap,
    Essay,
}

impl QuestionKind {
    /// The wire/database spelling of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Boolean => "boolean",
            QuestionKind::SingleChoice => "single-choice",
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::FreeText => "free-text",
            QuestionKind::Categorizer => "categorizer",
            QuestionKind::MultipleCategorizer => "multiple-categorizer",
            QuestionKind::Sorter => "sorter",
            QuestionKind::Cloze => "cloze",
            QuestionKind::Hotspot => "hotspot",
            QuestionKind::Gap => "gap",
            QuestionKind::Essay => "essay",
        }
    }
}

/// Geometry descriptor required for hotspot questions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HotspotData {
    #[validate(range(min = 1, message = "height must be a positive integer"))]
    pub height: i32,
    #[validate(range(min = 1, message = "width must be a positive integer"))]
    pub width: i32,
    #[validate(
        length(min = 1, message = "an image reference is required"),
        custom(function = validate_image_reference)
    )]
    pub image: String,
    #[serde(default)]
    pub require_all: bool,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one shape is required"), nested)]
    pub shapes: Vec<HotspotShape>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HotspotShape {
    #[validate(length(min = 1, message = "a shape kind is required"))]
    pub kind: String,
    pub points: Option<Vec<HotspotPoint>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotPoint {
    pub x: i64,
    pub y: i64,
}

/// Rejects image references that claim to be URLs but do not parse as one.
/// Bare CDN public ids are accepted as-is.
fn validate_image_reference(image: &str) -> Result<(), validator::ValidationError> {
    if image.contains("://") && url::Url::parse(image).is_err() {
        return Err(validator::ValidationError::new("invalid_image_url"));
    }
    Ok(())
}

/// The composite payload accepted by the save operation.
///
/// Child collections are diffs against persisted state: an omitted collection
/// leaves that collection untouched, an empty one deletes every child.
/// A child id is either a durable identifier (update) or a client-supplied
/// temporary identifier (creation).
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuestionPayload {
    pub id: Option<Uuid>,
    pub kind: QuestionKind,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Title length must be between 1 and 500 characters."
    ))]
    pub title: String,
    pub content: Option<Value>,
    pub raw_content: Option<String>,
    pub explanation: Option<Value>,
    pub hotspot_data: Option<HotspotData>,
    pub gap_text: Option<String>,
    pub gaps: Option<Vec<Value>>,
    pub is_true_correct: Option<bool>,
    #[validate(range(min = 0.0, message = "Weight must not be negative."))]
    pub weight: Option<f64>,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub question_set: Option<Uuid>,
    pub copied_from: Option<Uuid>,
    pub is_archived: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub choices: Option<Vec<ChoicePayload>>,
    pub categories: Option<Vec<CategoryPayload>>,
    pub items: Option<Vec<CategoryItemPayload>>,
    pub clozes: Option<Vec<ClozePayload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoicePayload {
    pub id: Option<String>,
    pub content: Option<Value>,
    pub is_correct: Option<bool>,
    pub order: Option<i32>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPayload {
    pub id: Option<String>,
    pub content: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryItemPayload {
    pub id: Option<String>,
    pub content: Option<Value>,
    /// Temporary or durable ids of the categories this item belongs to.
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClozePayload {
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<ClozeChoicePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClozeChoicePayload {
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
    pub order: Option<i32>,
}

/// Represents the 'questions' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionRow {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub content: Option<Value>,
    pub raw_content: Option<String>,
    pub explanation: Option<Value>,
    pub hotspot_data: Option<Value>,
    pub gap_text: Option<String>,
    pub gaps: Option<Value>,
    pub is_true_correct: Option<bool>,
    pub weight: f64,
    pub image: Option<String>,
    pub audio: Option<String>,
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub question_set: Uuid,
    pub owner: Option<Uuid>,
    pub copied_from: Option<Uuid>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub modified_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'choices' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChoiceRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: Option<Value>,
    pub is_correct: Option<bool>,
    pub position: i32,
    pub image: Option<String>,
}

/// Represents the 'categories' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: Option<Value>,
}

/// Represents the 'category_items' table, with the category ids of the
/// many-to-many relation aggregated in.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryItemRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: Option<Value>,
    pub categories: Vec<Uuid>,
}

/// Represents the 'clozes' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClozeRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub position: i32,
}

/// Represents the 'cloze_choices' table. The question reference is
/// denormalized alongside the owning cloze.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClozeChoiceRow {
    pub id: Uuid,
    pub cloze_id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub is_correct: bool,
    pub position: i32,
}

/// DTO for reading a question back with its full child graph.
#[derive(Debug, Serialize)]
pub struct CompositeQuestion {
    #[serde(flatten)]
    pub question: QuestionRow,
    pub choices: Vec<ChoiceRow>,
    pub categories: Vec<CategoryRow>,
    pub items: Vec<CategoryItemRow>,
    pub clozes: Vec<ClozeNode>,
}

#[derive(Debug, Serialize)]
pub struct ClozeNode {
    pub id: Uuid,
    pub position: i32,
    pub choices: Vec<ClozeChoiceRow>,
}
