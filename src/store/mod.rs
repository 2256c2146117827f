// src/store/mod.rs

pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::SaveError;
use crate::models::question::{
    CategoryItemRow, CategoryRow, ChoiceRow, ClozeChoiceRow, ClozeRow, QuestionRow,
};

/// Scalar and JSON state of a question, written in the final step of a
/// composite save. Kind-specific fields are populated from the validated
/// `KindData`, so only the kind-appropriate sub-structure is ever persisted.
#[derive(Debug, Clone)]
pub struct QuestionWrite {
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
}

#[derive(Debug, Clone)]
pub struct ChoiceWrite {
    pub content: Option<Value>,
    pub is_correct: Option<bool>,
    pub position: i32,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryWrite {
    pub content: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CategoryItemWrite {
    pub content: Option<Value>,
    /// Durable category ids only; temporary references are resolved before
    /// the write reaches the store.
    pub categories: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ClozeWrite {
    pub position: i32,
}

#[derive(Debug, Clone)]
pub struct ClozeChoiceWrite {
    pub cloze_id: Uuid,
    pub content: String,
    pub is_correct: bool,
    pub position: i32,
}

/// The storage collaborator of one composite save operation.
///
/// Implementations issue individual create/read/update/delete operations;
/// they never commit. The caller owns the transaction boundary and discards
/// all writes when any step of the save fails.
#[async_trait]
pub trait QuestionStore: Send {
    async fn question_set_exists(&mut self, id: Uuid) -> Result<bool, SaveError>;

    async fn fetch_question(&mut self, id: Uuid) -> Result<Option<QuestionRow>, SaveError>;

    /// Inserts the bare question row so child rows have a parent to
    /// reference. The full scalar state lands later via `write_question`.
    async fn insert_question_stub(
        &mut self,
        question_set: Uuid,
        kind: &str,
        owner: Option<Uuid>,
    ) -> Result<Uuid, SaveError>;

    async fn write_question(&mut self, id: Uuid, write: &QuestionWrite) -> Result<(), SaveError>;

    async fn list_choices(&mut self, question: Uuid) -> Result<Vec<ChoiceRow>, SaveError>;
    async fn insert_choice(&mut self, question: Uuid, write: &ChoiceWrite)
    -> Result<Uuid, SaveError>;
    async fn update_choice(&mut self, id: Uuid, write: &ChoiceWrite) -> Result<(), SaveError>;
    async fn delete_choice(&mut self, id: Uuid) -> Result<(), SaveError>;

    async fn list_categories(&mut self, question: Uuid) -> Result<Vec<CategoryRow>, SaveError>;
    async fn insert_category(
        &mut self,
        question: Uuid,
        write: &CategoryWrite,
    ) -> Result<Uuid, SaveError>;
    async fn update_category(&mut self, id: Uuid, write: &CategoryWrite) -> Result<(), SaveError>;
    async fn delete_category(&mut self, id: Uuid) -> Result<(), SaveError>;

    async fn list_items(&mut self, question: Uuid) -> Result<Vec<CategoryItemRow>, SaveError>;
    async fn insert_item(
        &mut self,
        question: Uuid,
        write: &CategoryItemWrite,
    ) -> Result<Uuid, SaveError>;
    async fn update_item(&mut self, id: Uuid, write: &CategoryItemWrite) -> Result<(), SaveError>;
    async fn delete_item(&mut self, id: Uuid) -> Result<(), SaveError>;

    async fn list_clozes(&mut self, question: Uuid) -> Result<Vec<ClozeRow>, SaveError>;
    async fn insert_cloze(&mut self, question: Uuid, write: &ClozeWrite)
    -> Result<Uuid, SaveError>;
    async fn update_cloze(&mut self, id: Uuid, write: &ClozeWrite) -> Result<(), SaveError>;
    /// Deleting a cloze cascades to its cloze choices.
    async fn delete_cloze(&mut self, id: Uuid) -> Result<(), SaveError>;

    async fn list_cloze_choices(&mut self, cloze: Uuid)
    -> Result<Vec<ClozeChoiceRow>, SaveError>;
    async fn insert_cloze_choice(
        &mut self,
        question: Uuid,
        write: &ClozeChoiceWrite,
    ) -> Result<Uuid, SaveError>;
    async fn update_cloze_choice(
        &mut self,
        id: Uuid,
        write: &ClozeChoiceWrite,
    ) -> Result<(), SaveError>;
    async fn delete_cloze_choice(&mut self, id: Uuid) -> Result<(), SaveError>;
}

/// Set-level storage operations used when reordering the questions of a set.
/// Same transaction contract as `QuestionStore`.
#[async_trait]
pub trait SetStore: Send {
    /// Every question of the set (archived included), in persisted order.
    async fn list_set_question_ids(&mut self, set: Uuid) -> Result<Vec<Uuid>, SaveError>;

    async fn write_question_position(&mut self, id: Uuid, position: i32)
    -> Result<(), SaveError>;

    /// A solo practice session records the previous ordering, so it is
    /// invalidated together with the position writes.
    async fn clear_solo_session(&mut self, set: Uuid) -> Result<(), SaveError>;
}
